use proesmans_image::{Grid, ImageSize};

/// Check whether the fractional position `(x, y)` lies inside `[0, width - 1] x [0, height - 1]`.
///
/// Positions passing this test can be handed to [`bilinear_interpolation`].
/// `NaN` coordinates are never inside.
#[inline]
pub fn is_inside(size: ImageSize, x: f32, y: f32) -> bool {
    x >= 0.0 && x <= (size.width - 1) as f32 && y >= 0.0 && y <= (size.height - 1) as f32
}

/// Sample `grid` at the fractional position `(x, y)` with bilinear interpolation.
///
/// When one of the coordinates is integral the sample reduces to a linear
/// interpolation along the other axis (or to a direct lookup when both are),
/// so integral positions never touch the next row or column and return the
/// stored value exactly.
///
/// PRECONDITION: `(x, y)` must satisfy [`is_inside`] for the size of `grid`.
///
/// # Examples
///
/// ```
/// use proesmans_flow::interpolation::bilinear_interpolation;
/// use proesmans_image::Grid;
///
/// let grid = Grid::from_fn([2, 2].into(), |x, y| (x + 2 * y) as f32);
///
/// assert_eq!(bilinear_interpolation(&grid, 1.0, 1.0), 3.0);
/// assert_eq!(bilinear_interpolation(&grid, 0.5, 0.5), 1.5);
/// ```
pub fn bilinear_interpolation(grid: &Grid, x: f32, y: f32) -> f32 {
    let base_x = x.floor();
    let base_y = y.floor();
    let dx = x - base_x;
    let dy = y - base_y;
    let (ix, iy) = (base_x as usize, base_y as usize);

    if dx == 0.0 && dy == 0.0 {
        grid[(ix, iy)]
    } else if dx == 0.0 {
        (1.0 - dy) * grid[(ix, iy)] + dy * grid[(ix, iy + 1)]
    } else if dy == 0.0 {
        (1.0 - dx) * grid[(ix, iy)] + dx * grid[(ix + 1, iy)]
    } else {
        (1.0 - dx) * (1.0 - dy) * grid[(ix, iy)]
            + (1.0 - dx) * dy * grid[(ix, iy + 1)]
            + dx * (1.0 - dy) * grid[(ix + 1, iy)]
            + dx * dy * grid[(ix + 1, iy + 1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_integral_positions_are_exact() {
        let grid = Grid::from_fn([3, 3].into(), |x, y| 0.1 * (x * 3 + y) as f32);
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(
                    bilinear_interpolation(&grid, x as f32, y as f32),
                    grid[(x, y)]
                );
            }
        }
    }

    #[test]
    fn test_last_row_and_column() {
        // the far edge is a valid position and must not read past the grid
        let grid = Grid::from_fn([3, 2].into(), |x, y| (x + 10 * y) as f32);
        assert_eq!(bilinear_interpolation(&grid, 2.0, 1.0), 12.0);
        assert_relative_eq!(bilinear_interpolation(&grid, 2.0, 0.5), 7.0);
        assert_relative_eq!(bilinear_interpolation(&grid, 1.5, 1.0), 11.5);
    }

    #[test]
    fn test_bilinear_plane_is_exact() {
        let grid = Grid::from_fn([4, 4].into(), |x, y| 2.0 * x as f32 - 3.0 * y as f32);
        assert_relative_eq!(bilinear_interpolation(&grid, 1.25, 2.75), -5.75);
        assert_relative_eq!(bilinear_interpolation(&grid, 0.5, 0.0), 1.0);
        assert_relative_eq!(bilinear_interpolation(&grid, 0.0, 0.5), -1.5);
    }

    #[test]
    fn test_is_inside() {
        let size = ImageSize {
            width: 4,
            height: 3,
        };
        assert!(is_inside(size, 0.0, 0.0));
        assert!(is_inside(size, 3.0, 2.0));
        assert!(is_inside(size, 2.5, 1.25));
        assert!(!is_inside(size, -0.1, 1.0));
        assert!(!is_inside(size, 3.01, 1.0));
        assert!(!is_inside(size, 1.0, 2.5));
        assert!(!is_inside(size, f32::NAN, 1.0));
    }
}
