use proesmans_image::{Grid, Picture};

use crate::{
    error::FlowError,
    flow::Flow,
    gradient::{combine, spatial_gradient},
    interpolation::{bilinear_interpolation, is_inside},
    parallel::{for_each_row_pair, ExecutionStrategy},
};

/// 8-connected neighbourhood as `(dx, dy, weight)`: orthogonal neighbours weigh
/// twice as much as diagonal ones.
const NEIGHBOURS: [(isize, isize, f32); 8] = [
    (-1, -1, 1.0),
    (0, -1, 2.0),
    (1, -1, 1.0),
    (1, 0, 2.0),
    (1, 1, 1.0),
    (0, 1, 2.0),
    (-1, 1, 1.0),
    (-1, 0, 2.0),
];

/// Everything the data term of one flow direction reads.
///
/// The forward direction pairs the first frame (source) with the second
/// (target) and uses the gradients of the first frame; the reverse direction
/// swaps the frames.
pub struct DataTerm<'a> {
    /// The frame the flow starts from.
    pub source: &'a Picture,
    /// The frame the flow points into.
    pub target: &'a Picture,
    /// Spatial gradient of `source` along x.
    pub ex: Grid,
    /// Spatial gradient of `source` along y.
    pub ey: Grid,
}

impl<'a> DataTerm<'a> {
    /// Bundle two frames with the spatial gradients of `source`.
    ///
    /// # Errors
    ///
    /// If the frames do not share the same extents, an error is returned.
    pub fn new(source: &'a Picture, target: &'a Picture) -> Result<Self, FlowError> {
        source.check_same_size(target)?;

        let mut ex = Grid::from_size_val(source.size(), 0.0);
        let mut ey = Grid::from_size_val(source.size(), 0.0);
        spatial_gradient(source, &mut ex, &mut ey)?;

        Ok(Self {
            source,
            target,
            ex,
            ey,
        })
    }
}

// consistency weighted mean of the 8 neighbours, or the pixel itself when no neighbour counts
#[inline]
fn neighbourhood_average(prev: &Flow, consistency: &Grid, x: usize, y: usize) -> (f32, f32) {
    let (mut u_sum, mut v_sum, mut weight_sum) = (0.0, 0.0, 0.0);

    for &(dx, dy, weight) in NEIGHBOURS.iter() {
        let nx = x.wrapping_add_signed(dx);
        let ny = y.wrapping_add_signed(dy);
        let c = consistency[(nx, ny)];
        if c >= 0.0 {
            let (u, v) = prev.at(nx, ny);
            u_sum += weight * u * c;
            v_sum += weight * v * c;
            weight_sum += weight * c;
        }
    }

    if weight_sum != 0.0 {
        (u_sum / weight_sum, v_sum / weight_sum)
    } else {
        prev.at(x, y)
    }
}

#[inline]
fn relax_pixel(
    prev: &Flow,
    data: &DataTerm,
    lambda: f32,
    consistency: &Grid,
    x: usize,
    y: usize,
) -> (f32, f32) {
    let (u_avg, v_avg) = neighbourhood_average(prev, consistency, x, y);

    let (pred_x, pred_y) = (x as f32 + u_avg, y as f32 + v_avg);
    if !is_inside(prev.size(), pred_x, pred_y) {
        // the match leaves the image, keep the smoothed value only
        return (u_avg, v_avg);
    }

    let [r1, g1, b1] = data.source.channels();
    let [r2, g2, b2] = data.target.channels();
    let diff = combine(
        bilinear_interpolation(r2, pred_x, pred_y) - r1[(x, y)],
        bilinear_interpolation(g2, pred_x, pred_y) - g1[(x, y)],
        bilinear_interpolation(b2, pred_x, pred_y) - b1[(x, y)],
    );

    let (ex, ey) = (data.ex[(x, y)], data.ey[(x, y)]);
    let step = lambda * diff / (1.0 + lambda * (ex * ex + ey * ey).sqrt());

    (u_avg - ex * step, v_avg - ey * step)
}

/// Run one relaxation step of the flow of one direction.
///
/// Every interior pixel of `next` receives the consistency weighted average of
/// the 8 neighbours of `prev`, corrected by a gradient descent step towards
/// brightness constancy between `data.source` at the pixel and `data.target` at
/// the displaced position. Neighbours with a negative consistency are ignored.
/// The step size `lambda / (1 + lambda * |∇I|)` shrinks on strong edges. When
/// the displaced position leaves the image only the average is kept.
///
/// Only `prev` is read, so `next` must be a distinct buffer. The border of
/// `next` is not written; run [`crate::border::fix_edges`] afterwards.
///
/// # Arguments
///
/// * `prev` - The flow of the previous iteration.
/// * `next` - The destination flow, with the size of `prev`.
/// * `data` - The frames and gradients of this direction.
/// * `lambda` - The smoothing parameter, larger values trust the data term more.
/// * `consistency` - The consistency field of `prev`.
/// * `strategy` - How the rows are processed.
pub fn refine_flow(
    prev: &Flow,
    next: &mut Flow,
    data: &DataTerm,
    lambda: f32,
    consistency: &Grid,
    strategy: ExecutionStrategy,
) -> Result<(), FlowError> {
    let size = prev.size();
    next.check_size(size)?;
    data.source.r().check_same_size(consistency)?;
    prev.check_size(data.source.size())?;

    let (w, h) = (size.width, size.height);
    let (next_u, next_v) = next.components_mut();

    for_each_row_pair(
        strategy,
        w,
        next_u.as_slice_mut(),
        next_v.as_slice_mut(),
        |y, row_u, row_v| {
            if y == 0 || y + 1 >= h {
                return;
            }
            for x in 1..w.saturating_sub(1) {
                let (u, v) = relax_pixel(prev, data, lambda, consistency, x, y);
                row_u[x] = u;
                row_v[x] = v;
            }
        },
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consistency::OFF_IMAGE;
    use approx::assert_relative_eq;
    use proesmans_image::ImageSize;

    const SIZE: ImageSize = ImageSize {
        width: 6,
        height: 5,
    };

    fn gray(f: impl Fn(usize, usize) -> f32) -> Result<Picture, FlowError> {
        let grid = Grid::from_fn(SIZE, f);
        Ok(Picture::from_channels(grid.clone(), grid.clone(), grid)?)
    }

    #[test]
    fn test_flat_frames_only_smooth() -> Result<(), FlowError> {
        let pic = Picture::from_size_val(SIZE, 0.5);
        let data = DataTerm::new(&pic, &pic)?;
        let consistency = Grid::from_size_val(SIZE, 1.0);

        let mut prev = Flow::zeros(SIZE);
        prev.set(2, 2, (8.0, -8.0));
        let mut next = Flow::zeros(SIZE);
        refine_flow(&prev, &mut next, &data, 10.0, &consistency, ExecutionStrategy::Serial)?;

        // the spike is spread to its neighbours, the centre only sees zeros
        assert_eq!(next.at(2, 2), (0.0, 0.0));
        assert_relative_eq!(next.at(3, 2).0, 8.0 * 2.0 / 12.0);
        assert_relative_eq!(next.at(3, 3).0, 8.0 / 12.0);
        assert_relative_eq!(next.at(1, 1).1, -8.0 / 12.0);

        Ok(())
    }

    #[test]
    fn test_off_image_neighbours_are_ignored() -> Result<(), FlowError> {
        let pic = Picture::from_size_val(SIZE, 0.5);
        let data = DataTerm::new(&pic, &pic)?;

        let prev = Flow::from_components(
            Grid::from_fn(SIZE, |x, _| x as f32 * 0.1),
            Grid::from_size_val(SIZE, 0.0),
        )?;
        let mut consistency = Grid::from_size_val(SIZE, OFF_IMAGE);
        consistency[(3, 2)] = 0.5;

        let mut next = Flow::zeros(SIZE);
        refine_flow(&prev, &mut next, &data, 10.0, &consistency, ExecutionStrategy::Serial)?;

        // only (3, 2) contributes to its neighbours
        assert_relative_eq!(next.at(2, 2).0, 0.3);
        assert_relative_eq!(next.at(4, 1).0, 0.3);
        // no neighbour counts: the previous value is kept
        assert_relative_eq!(next.at(3, 2).0, 0.3);
        assert_relative_eq!(next.at(1, 1).0, 0.1);

        Ok(())
    }

    #[test]
    fn test_data_term_moves_towards_match() -> Result<(), FlowError> {
        // the second frame is the first moved one pixel to the right
        let source = gray(|x, _| 0.1 * x as f32)?;
        let target = gray(|x, _| 0.1 * (x as f32 - 1.0))?;
        let data = DataTerm::new(&source, &target)?;
        let consistency = Grid::from_size_val(SIZE, 1.0);

        let prev = Flow::zeros(SIZE);
        let mut next = Flow::zeros(SIZE);
        let lambda = 10.0;
        refine_flow(&prev, &mut next, &data, lambda, &consistency, ExecutionStrategy::Serial)?;

        // ex = 0.2, diff = -0.1
        let step = lambda * -0.1 / (1.0 + lambda * 0.2);
        for y in 1..SIZE.height - 1 {
            for x in 1..SIZE.width - 1 {
                let (u, v) = next.at(x, y);
                assert_relative_eq!(u, -0.2 * step, max_relative = 1e-5);
                assert!(u > 0.0);
                assert_eq!(v, 0.0);
            }
        }

        Ok(())
    }

    #[test]
    fn test_border_is_not_written() -> Result<(), FlowError> {
        let pic = Picture::from_size_val(SIZE, 0.5);
        let data = DataTerm::new(&pic, &pic)?;
        let consistency = Grid::from_size_val(SIZE, 1.0);
        let prev = Flow::from_size_val(SIZE, 1.0, 1.0);
        let mut next = Flow::from_size_val(SIZE, 7.0, 7.0);
        refine_flow(&prev, &mut next, &data, 1.0, &consistency, ExecutionStrategy::Serial)?;

        assert_eq!(next.at(0, 0), (7.0, 7.0));
        assert_eq!(next.at(5, 2), (7.0, 7.0));
        assert_eq!(next.at(3, 4), (7.0, 7.0));
        assert_eq!(next.at(2, 2), (1.0, 1.0));

        Ok(())
    }

    #[test]
    fn test_parallel_matches_serial() -> Result<(), FlowError> {
        let source = gray(|x, y| ((x * 7 + y * 3) % 11) as f32 / 11.0)?;
        let target = gray(|x, y| ((x * 5 + y * 2) % 11) as f32 / 11.0)?;
        let data = DataTerm::new(&source, &target)?;
        let consistency = Grid::from_fn(SIZE, |x, y| if (x + y) % 4 == 0 { OFF_IMAGE } else { 0.7 });
        let prev = Flow::from_size_val(SIZE, 0.4, -0.3);

        let mut serial = Flow::zeros(SIZE);
        let mut parallel = Flow::zeros(SIZE);
        refine_flow(&prev, &mut serial, &data, 5.0, &consistency, ExecutionStrategy::Serial)?;
        refine_flow(&prev, &mut parallel, &data, 5.0, &consistency, ExecutionStrategy::ParallelRows)?;
        assert_eq!(serial, parallel);

        Ok(())
    }

    #[test]
    fn test_size_mismatch() -> Result<(), FlowError> {
        let pic = Picture::from_size_val(SIZE, 0.5);
        let data = DataTerm::new(&pic, &pic)?;
        let consistency = Grid::from_size_val(SIZE, 1.0);
        let prev = Flow::zeros(SIZE);
        let mut next = Flow::zeros([6, 4].into());
        assert!(
            refine_flow(&prev, &mut next, &data, 1.0, &consistency, ExecutionStrategy::Serial)
                .is_err()
        );

        let other = Picture::from_size_val([5, 5].into(), 0.5);
        assert!(DataTerm::new(&pic, &other).is_err());

        Ok(())
    }
}
