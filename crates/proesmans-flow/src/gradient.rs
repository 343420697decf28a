use proesmans_image::{Grid, Picture};

use crate::{border::fill_border, error::FlowError};

/// Combine three per-channel readings into one by keeping the reading with the
/// largest magnitude. Ties resolve towards the later reading.
///
/// ```
/// use proesmans_flow::gradient::combine;
///
/// assert_eq!(combine(0.5, -2.0, 1.0), -2.0);
/// assert_eq!(combine(1.0, -1.0, 0.0), -1.0);
/// ```
#[inline]
pub fn combine(a: f32, b: f32, c: f32) -> f32 {
    let ab = if a.abs() > b.abs() { a } else { b };
    if ab.abs() > c.abs() {
        ab
    } else {
        c
    }
}

// 3x3 sobel response along x at an interior pixel, normalized by 4
#[inline]
fn sobel_x(p: &Grid, x: usize, y: usize) -> f32 {
    ((p[(x + 1, y - 1)] + 2.0 * p[(x + 1, y)] + p[(x + 1, y + 1)])
        - (p[(x - 1, y - 1)] + 2.0 * p[(x - 1, y)] + p[(x - 1, y + 1)]))
        / 4.0
}

// 3x3 sobel response along y at an interior pixel, normalized by 4
#[inline]
fn sobel_y(p: &Grid, x: usize, y: usize) -> f32 {
    ((p[(x - 1, y + 1)] + 2.0 * p[(x, y + 1)] + p[(x + 1, y + 1)])
        - (p[(x - 1, y - 1)] + 2.0 * p[(x, y - 1)] + p[(x + 1, y - 1)]))
        / 4.0
}

/// Compute the spatial gradient of a picture with a normalized Sobel operator.
///
/// Each channel is filtered independently and the three responses are merged
/// with [`combine`]. Interior pixels are filtered directly; the outermost ring
/// replicates the gradient one pixel inward.
///
/// # Arguments
///
/// * `src` - The source picture.
/// * `ex` - The destination gradient along x, with the size of `src`.
/// * `ey` - The destination gradient along y, with the size of `src`.
///
/// PRECONDITION: `src`, `ex` and `ey` must have the same shape.
pub fn spatial_gradient(src: &Picture, ex: &mut Grid, ey: &mut Grid) -> Result<(), FlowError> {
    let [r, g, b] = src.channels();
    r.check_same_size(ex)?;
    r.check_same_size(ey)?;

    let (w, h) = (src.width(), src.height());
    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            ex[(x, y)] = combine(sobel_x(r, x, y), sobel_x(g, x, y), sobel_x(b, x, y));
            ey[(x, y)] = combine(sobel_y(r, x, y), sobel_y(g, x, y), sobel_y(b, x, y));
        }
    }

    fill_border(ex);
    fill_border(ey);

    Ok(())
}

/// Compute the temporal gradient `next - prev` of two pictures.
///
/// The per-channel differences are merged with [`combine`] at every pixel,
/// border included.
///
/// # Arguments
///
/// * `prev` - The earlier picture.
/// * `next` - The later picture.
/// * `et` - The destination gradient, with the size of the pictures.
pub fn temporal_gradient(prev: &Picture, next: &Picture, et: &mut Grid) -> Result<(), FlowError> {
    prev.check_same_size(next)?;
    prev.r().check_same_size(et)?;

    let [r1, g1, b1] = prev.channels();
    let [r2, g2, b2] = next.channels();

    et.as_slice_mut()
        .iter_mut()
        .enumerate()
        .for_each(|(i, dst)| {
            *dst = combine(
                r2.as_slice()[i] - r1.as_slice()[i],
                g2.as_slice()[i] - g1.as_slice()[i],
                b2.as_slice()[i] - b1.as_slice()[i],
            );
        });

    Ok(())
}
