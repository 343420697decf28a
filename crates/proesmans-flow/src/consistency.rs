use proesmans_image::Grid;

use crate::{
    error::FlowError,
    flow::Flow,
    interpolation::{bilinear_interpolation, is_inside},
    parallel::{for_each_row, ExecutionStrategy},
};

/// Consistency value of a pixel whose displacement points outside the image.
///
/// Such pixels carry no information and are excluded from every weighted sum.
pub const OFF_IMAGE: f32 = -1.0;

/// Fraction of the mean disagreement used as the normalisation constant `K`.
pub const NORMALIZATION_FACTOR: f32 = 0.9;

/// Score how well `flow` agrees with the opposite-direction flow `opposite`.
///
/// Each pixel is moved by its displacement, truncated to the pixel grid, and
/// the opposite flow is read there. For a perfectly consistent pair the two
/// displacements cancel. The raw disagreement `C` (the norm of their sum) is
/// mapped to `1 / (1 + (C / K)²)` with `K = 0.9 * mean(C)`, so values lie in
/// `(0, 1]` and `1` means perfect agreement. Pixels whose truncated
/// destination falls outside the image get [`OFF_IMAGE`].
///
/// When every eligible pixel agrees perfectly (`K == 0`) all of them score `1`.
///
/// # Arguments
///
/// * `flow` - The flow being scored.
/// * `opposite` - The flow of the other direction, with the size of `flow`.
/// * `strategy` - How the rows are processed.
///
/// # Returns
///
/// The consistency field, with the size of `flow`.
pub fn consistency(
    flow: &Flow,
    opposite: &Flow,
    strategy: ExecutionStrategy,
) -> Result<Grid, FlowError> {
    opposite.check_size(flow.size())?;

    let size = flow.size();
    let mut scores = Grid::from_size_val(size, OFF_IMAGE);

    for_each_row(strategy, size.width, scores.as_slice_mut(), |y, row| {
        for (x, dst) in row.iter_mut().enumerate() {
            let (u, v) = flow.at(x, y);
            // truncated towards zero, so (-1, 0) still lands on the first pixel
            let (pred_x, pred_y) = ((x as f32 + u).trunc(), (y as f32 + v).trunc());
            if !is_inside(size, pred_x, pred_y) {
                continue;
            }
            let u_diff = u + bilinear_interpolation(opposite.u(), pred_x, pred_y);
            let v_diff = v + bilinear_interpolation(opposite.v(), pred_x, pred_y);
            *dst = (u_diff * u_diff + v_diff * v_diff).sqrt();
        }
    })?;

    normalize(&mut scores);

    Ok(scores)
}

// maps raw disagreements in [0, inf) to agreement scores in (0, 1]
fn normalize(scores: &mut Grid) {
    let (sum, count) = scores
        .as_slice()
        .iter()
        .filter(|&&c| c >= 0.0)
        .fold((0.0f64, 0usize), |(sum, count), &c| (sum + c as f64, count + 1));

    if count == 0 {
        log::trace!("consistency: every pixel leaves the image");
        return;
    }

    let k = (NORMALIZATION_FACTOR as f64 * sum / count as f64) as f32;
    log::trace!("consistency: {count} eligible pixels, K = {k}");

    scores
        .as_slice_mut()
        .iter_mut()
        .filter(|c| **c >= 0.0)
        .for_each(|c| {
            *c = if k > 0.0 {
                let r = *c / k;
                1.0 / (1.0 + r * r)
            } else {
                1.0
            };
        });
}
