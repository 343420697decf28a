use proesmans_image::Grid;

use crate::flow::Flow;

/// Overwrite the outermost ring of `grid` with the values one pixel inward.
///
/// Corners copy their diagonal interior neighbour, the other border pixels copy
/// the adjacent pixel of the next row or column. Grids without an interior
/// (narrower or shorter than 3 pixels) are left untouched.
pub fn fill_border(grid: &mut Grid) {
    let (w, h) = (grid.width(), grid.height());
    if w < 3 || h < 3 {
        return;
    }

    // corners
    grid[(0, 0)] = grid[(1, 1)];
    grid[(w - 1, 0)] = grid[(w - 2, 1)];
    grid[(0, h - 1)] = grid[(1, h - 2)];
    grid[(w - 1, h - 1)] = grid[(w - 2, h - 2)];

    // top and bottom rows
    for x in 1..w - 1 {
        grid[(x, 0)] = grid[(x, 1)];
        grid[(x, h - 1)] = grid[(x, h - 2)];
    }

    // left and right columns
    for y in 1..h - 1 {
        grid[(0, y)] = grid[(1, y)];
        grid[(w - 1, y)] = grid[(w - 2, y)];
    }
}

/// Propagate the interior displacement of `flow` to its border pixels.
///
/// The relaxation stencil is undefined on the outermost ring, so this must run
/// after every update of the interior and before the flow is compared again.
pub fn fix_edges(flow: &mut Flow) {
    let (u, v) = flow.components_mut();
    fill_border(u);
    fill_border(v);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proesmans_image::ImageSize;

    fn donor(x: usize, y: usize, w: usize, h: usize) -> (usize, usize) {
        (x.clamp(1, w - 2), y.clamp(1, h - 2))
    }

    #[test]
    fn test_fill_border_copies_donors() {
        let size = ImageSize {
            width: 5,
            height: 4,
        };
        let mut grid = Grid::from_fn(size, |x, y| (x + 10 * y) as f32);
        let interior = grid.clone();
        fill_border(&mut grid);

        for y in 0..size.height {
            for x in 0..size.width {
                let (dx, dy) = donor(x, y, size.width, size.height);
                assert_eq!(grid[(x, y)], interior[(dx, dy)], "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_fill_border_corners() {
        let mut grid = Grid::from_fn([4, 4].into(), |x, y| (x * 4 + y) as f32);
        fill_border(&mut grid);
        assert_eq!(grid[(0, 0)], 5.0);
        assert_eq!(grid[(3, 0)], 9.0);
        assert_eq!(grid[(0, 3)], 6.0);
        assert_eq!(grid[(3, 3)], 10.0);
    }

    #[test]
    fn test_fill_border_without_interior() {
        let mut grid = Grid::from_fn([2, 5].into(), |x, y| (x + y) as f32);
        let before = grid.clone();
        fill_border(&mut grid);
        assert_eq!(grid, before);
    }

    #[test]
    fn test_fix_edges_both_components() {
        let size = ImageSize {
            width: 4,
            height: 3,
        };
        let mut flow = Flow::zeros(size);
        flow.set(1, 1, (1.0, -1.0));
        flow.set(2, 1, (2.0, -2.0));
        fix_edges(&mut flow);

        assert_eq!(flow.u().as_slice(), &[1.0, 1.0, 2.0, 2.0, 1.0, 1.0, 2.0, 2.0, 1.0, 1.0, 2.0, 2.0]);
        assert_eq!(flow.at(3, 2), (2.0, -2.0));
        assert_eq!(flow.at(0, 0), (1.0, -1.0));
    }
}
