use proesmans_image::{Grid, Picture};

use crate::{error::FlowError, flow::Flow};

// 2x2 block average, odd trailing rows and columns are dropped
fn half_grid(src: &Grid) -> Grid {
    Grid::from_fn(src.size().half(), |x, y| {
        let (sx, sy) = (2 * x, 2 * y);
        (src[(sx, sy)] + src[(sx + 1, sy)] + src[(sx, sy + 1)] + src[(sx + 1, sy + 1)]) / 4.0
    })
}

/// Downsample a picture to half resolution.
///
/// Every channel is reduced by averaging 2x2 blocks. Odd extents round down,
/// the last column or row of an odd sized picture is dropped.
///
/// # Arguments
///
/// * `src` - The picture to downsample.
///
/// # Returns
///
/// The picture of size `src.size().half()`.
///
/// # Example
///
/// ```
/// use proesmans_flow::pyramid::half_picture;
/// use proesmans_image::{Grid, Picture};
///
/// let grid = Grid::from_fn([4, 2].into(), |x, _| x as f32);
/// let pic = Picture::from_channels(grid.clone(), grid.clone(), grid).unwrap();
///
/// let half = half_picture(&pic).unwrap();
///
/// assert_eq!(half.r().as_slice(), &[0.5, 2.5]);
/// ```
pub fn half_picture(src: &Picture) -> Result<Picture, FlowError> {
    let [r, g, b] = src.channels();
    Ok(Picture::from_channels(
        half_grid(r),
        half_grid(g),
        half_grid(b),
    )?)
}

/// Downsample a flow to half resolution by averaging 2x2 blocks.
///
/// The displacement values are kept as they are, so a seed flow expressed in
/// full resolution pixels is handed unchanged to the coarser level.
pub fn half_flow(src: &Flow) -> Result<Flow, FlowError> {
    Flow::from_components(half_grid(src.u()), half_grid(src.v()))
}

/// Upsample a half resolution flow into a full resolution flow.
///
/// Each coarse pixel is replicated into a 2x2 block and its displacement is
/// doubled. Only the leading `2 * src.width()` columns and `2 * src.height()`
/// rows of `dst` are written; for odd extents the last column or row keeps its
/// value.
///
/// # Arguments
///
/// * `src` - The half resolution flow.
/// * `dst` - The full resolution flow, with `dst.size().half() == src.size()`.
pub fn double_flow(src: &Flow, dst: &mut Flow) -> Result<(), FlowError> {
    let expected = dst.size().half();
    if src.size() != expected {
        return Err(FlowError::FlowSizeMismatch {
            expected,
            actual: src.size(),
        });
    }

    for y in 0..2 * src.height() {
        for x in 0..2 * src.width() {
            let (u, v) = src.at(x / 2, y / 2);
            dst.set(x, y, (2.0 * u, 2.0 * v));
        }
    }

    Ok(())
}
