use proesmans_image::Grid;

use crate::{border::fix_edges, error::FlowError, flow::Flow};

/// Largest displacement magnitude, per component, produced by the initial estimate.
pub const FLOW_LIMIT: f32 = 3.0;

/// Separable 3x3 smoothing kernel used to accumulate the gradient products.
///
/// Indexed as `[dy + 1][dx + 1]`, already scaled by the global 0.25 factor.
#[rustfmt::skip]
pub const SMOOTHING_KERNEL: [[f32; 3]; 3] = [
    [0.25 * 0.25, 0.25 * 0.5, 0.25 * 0.25],
    [0.25 * 0.5,  0.25 * 1.0, 0.25 * 0.5],
    [0.25 * 0.25, 0.25 * 0.5, 0.25 * 0.25],
];

// kernel weighted sum of p * q over the 3x3 neighbourhood of an interior pixel
#[inline]
fn weighted_sum(p: &Grid, q: &Grid, x: usize, y: usize) -> f32 {
    let mut sum = 0.0;
    for (ky, row) in SMOOTHING_KERNEL.iter().enumerate() {
        for (kx, &w) in row.iter().enumerate() {
            let (sx, sy) = (x + kx - 1, y + ky - 1);
            sum += w * p[(sx, sy)] * q[(sx, sy)];
        }
    }
    sum
}

#[inline]
fn clamp_to_limit(value: f32) -> f32 {
    value.clamp(-FLOW_LIMIT, FLOW_LIMIT)
}

/// Estimate an initial flow from spatial and temporal gradients.
///
/// At every interior pixel the locally smoothed normal equations
///
/// ```text
/// A u + B v = C
/// B u + E v = F
/// ```
///
/// with `A = Σ Ix²`, `B = Σ Ix Iy`, `E = Σ Iy²`, `C = -Σ Ix It` and
/// `F = -Σ Iy It` are solved with Cramer's rule. A component whose determinant
/// vanishes is set to zero, any other is clamped to `±FLOW_LIMIT`. The border is
/// then filled from the interior.
///
/// # Arguments
///
/// * `ix` - The spatial gradient along x.
/// * `iy` - The spatial gradient along y.
/// * `it` - The temporal gradient.
/// * `flow` - The destination flow, with the size of the gradients.
pub fn initial_flow(ix: &Grid, iy: &Grid, it: &Grid, flow: &mut Flow) -> Result<(), FlowError> {
    ix.check_same_size(iy)?;
    ix.check_same_size(it)?;
    flow.check_size(ix.size())?;

    let (w, h) = (ix.width(), ix.height());
    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let a = weighted_sum(ix, ix, x, y);
            let b = weighted_sum(ix, iy, x, y);
            let c = -weighted_sum(ix, it, x, y);
            let d = b;
            let e = weighted_sum(iy, iy, x, y);
            let f = -weighted_sum(iy, it, x, y);

            let det_u = e * a - b * d;
            let u = if det_u != 0.0 {
                clamp_to_limit((e * c - b * f) / det_u)
            } else {
                0.0
            };

            let det_v = d * b - a * e;
            let v = if det_v != 0.0 {
                clamp_to_limit((d * c - a * f) / det_v)
            } else {
                0.0
            };

            flow.set(x, y, (u, v));
        }
    }

    fix_edges(flow);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proesmans_image::ImageSize;

    const SIZE: ImageSize = ImageSize {
        width: 6,
        height: 5,
    };

    // x gradient constant, y gradient alternating per column: the normal matrix is the identity
    fn decoupled_gradients() -> (Grid, Grid) {
        let ix = Grid::from_size_val(SIZE, 1.0);
        let iy = Grid::from_fn(SIZE, |x, _| if x % 2 == 0 { 1.0 } else { -1.0 });
        (ix, iy)
    }

    #[test]
    fn test_kernel_sums_to_one() {
        let sum: f32 = SMOOTHING_KERNEL.iter().flatten().sum();
        assert_relative_eq!(sum, 1.0);
    }

    #[test]
    fn test_small_solution_is_exact() -> Result<(), FlowError> {
        let (ix, iy) = decoupled_gradients();
        let it = Grid::from_size_val(SIZE, -0.5);
        let mut flow = Flow::zeros(SIZE);
        initial_flow(&ix, &iy, &it, &mut flow)?;

        for y in 0..SIZE.height {
            for x in 0..SIZE.width {
                let (u, v) = flow.at(x, y);
                assert_relative_eq!(u, 0.5);
                assert_relative_eq!(v, 0.0);
            }
        }

        Ok(())
    }

    #[test]
    fn test_solution_is_clamped() -> Result<(), FlowError> {
        let (ix, iy) = decoupled_gradients();

        let it = Grid::from_size_val(SIZE, -10.0);
        let mut flow = Flow::zeros(SIZE);
        initial_flow(&ix, &iy, &it, &mut flow)?;
        assert!(flow.u().as_slice().iter().all(|&u| u == FLOW_LIMIT));

        let it = Grid::from_size_val(SIZE, 10.0);
        initial_flow(&ix, &iy, &it, &mut flow)?;
        assert!(flow.u().as_slice().iter().all(|&u| u == -FLOW_LIMIT));
        assert!(flow.v().as_slice().iter().all(|&v| v == 0.0));

        Ok(())
    }

    #[test]
    fn test_singular_system_gives_zero() -> Result<(), FlowError> {
        // flat image: every determinant vanishes
        let zero = Grid::from_size_val(SIZE, 0.0);
        let it = Grid::from_size_val(SIZE, 1.0);
        let mut flow = Flow::from_size_val(SIZE, 9.0, 9.0);
        initial_flow(&zero, &zero, &it, &mut flow)?;

        assert!(flow.u().as_slice().iter().all(|&u| u == 0.0));
        assert!(flow.v().as_slice().iter().all(|&v| v == 0.0));

        Ok(())
    }

    #[test]
    fn test_size_mismatch() {
        let (ix, iy) = decoupled_gradients();
        let it = Grid::from_size_val([5, 5].into(), 0.0);
        let mut flow = Flow::zeros(SIZE);
        assert!(initial_flow(&ix, &iy, &it, &mut flow).is_err());

        let it = Grid::from_size_val(SIZE, 0.0);
        let mut flow = Flow::zeros([5, 5].into());
        assert!(initial_flow(&ix, &iy, &it, &mut flow).is_err());
    }
}
