use proesmans_image::{Grid, ImageSize, Picture};

use crate::{
    border::fix_edges,
    consistency::consistency,
    error::FlowError,
    flow::{Flow, TwinFlow},
    gradient::temporal_gradient,
    lucas_kanade::initial_flow,
    params::ProesmansParams,
    pyramid::{double_flow, half_flow, half_picture},
    relaxation::{refine_flow, DataTerm},
};

/// Smallest extent the 3x3 stencils can work on.
const MIN_EXTENT: usize = 3;

/// Result of the flow estimation.
#[derive(Debug, Clone)]
pub struct ProesmansResult {
    /// The forward (first to second frame) and reverse (second to first frame) flows.
    pub flows: TwinFlow,
    /// The total number of relaxation iterations executed over all levels.
    pub num_iterations: usize,
}

/// Estimate the dense optical flow between two frames in both directions.
///
/// The frames are processed coarse to fine over `params.levels` halvings. At
/// every level the forward and reverse flows are refined alternately for
/// `params.max_iterations` iterations, each direction weighted by how well it
/// agrees with the other one. The result of a level, upsampled, is the starting
/// point of the next finer level.
///
/// When `seed` is given it is the starting estimate of the finest level,
/// downsampled for the coarser ones. Without a seed the coarsest level starts
/// from zero, or from a least squares estimate when `params.levels == 0`.
///
/// # Arguments
///
/// * `p1` - The first frame.
/// * `p2` - The second frame, with the size of `p1`.
/// * `params` - The estimation parameters.
/// * `seed` - An optional starting estimate, with the size of `p1`.
///
/// # Returns
///
/// The forward and reverse flows at full resolution and the number of
/// iterations executed, always `params.max_iterations * (params.levels + 1)`.
///
/// # Errors
///
/// Fails before any computation when the frames or the seed do not share the
/// same extents, when `lambda` is invalid, or when the coarsest level would be
/// smaller than 3x3 pixels.
///
/// # Example
///
/// ```
/// use proesmans_flow::{compute_flow, ProesmansParams};
/// use proesmans_image::Picture;
///
/// let p1 = Picture::from_size_val([8, 8].into(), 0.5);
/// let p2 = p1.clone();
/// let params = ProesmansParams::default()
///     .with_levels(1)
///     .with_max_iterations(2);
///
/// let result = compute_flow(&p1, &p2, &params, None).unwrap();
///
/// assert_eq!(result.num_iterations, 4);
/// assert!(result.flows.forward.u().as_slice().iter().all(|&u| u == 0.0));
/// ```
pub fn compute_flow(
    p1: &Picture,
    p2: &Picture,
    params: &ProesmansParams,
    seed: Option<&TwinFlow>,
) -> Result<ProesmansResult, FlowError> {
    params.validate()?;
    p1.check_same_size(p2)?;

    let size = p1.size();
    if size.width < MIN_EXTENT || size.height < MIN_EXTENT {
        return Err(FlowError::ImageTooSmall(size));
    }

    let coarsest = coarsest_size(size, params.levels);
    if coarsest.width < MIN_EXTENT || coarsest.height < MIN_EXTENT {
        return Err(FlowError::TooManyLevels {
            levels: params.levels,
            size,
        });
    }

    let mut flows = match seed {
        Some(seed) => {
            seed.check_size(size)?;
            seed.clone()
        }
        None => TwinFlow::zeros(size),
    };

    log::debug!(
        "compute_flow: size {}x{}, levels {}, {} iterations per level, lambda {}",
        size.width,
        size.height,
        params.levels,
        params.max_iterations,
        params.lambda
    );

    let num_iterations = solve_level(p1, p2, &mut flows, seed.is_some(), params.levels, params)?;

    Ok(ProesmansResult {
        flows,
        num_iterations,
    })
}

fn coarsest_size(size: ImageSize, levels: usize) -> ImageSize {
    let shift = |extent: usize| {
        u32::try_from(levels)
            .ok()
            .and_then(|levels| extent.checked_shr(levels))
            .unwrap_or(0)
    };
    ImageSize {
        width: shift(size.width),
        height: shift(size.height),
    }
}

/// Solve one pyramid level, recursing into the coarser ones first.
///
/// On entry `flows` holds the starting estimate of this level if `seeded` is
/// true, zeros otherwise. On return it holds the refined flows of this level.
///
/// # Returns
///
/// The number of iterations executed at this level and all coarser ones.
pub fn solve_level(
    p1: &Picture,
    p2: &Picture,
    flows: &mut TwinFlow,
    seeded: bool,
    level: usize,
    params: &ProesmansParams,
) -> Result<usize, FlowError> {
    let mut num_iterations = 0;

    if level > 0 {
        let (half_p1, half_p2) = (half_picture(p1)?, half_picture(p2)?);
        let mut half_flows = if seeded {
            TwinFlow::new(half_flow(&flows.forward)?, half_flow(&flows.reverse)?)?
        } else {
            TwinFlow::zeros(half_p1.size())
        };

        num_iterations += solve_level(&half_p1, &half_p2, &mut half_flows, true, level - 1, params)?;

        double_flow(&half_flows.forward, &mut flows.forward)?;
        double_flow(&half_flows.reverse, &mut flows.reverse)?;
    }

    let forward = DataTerm::new(p1, p2)?;
    let reverse = DataTerm::new(p2, p1)?;

    if level == 0 && !seeded {
        log::debug!("level 0: no starting estimate, running the least squares estimate");
        estimate_initial_flow(&forward, &mut flows.forward)?;
        estimate_initial_flow(&reverse, &mut flows.reverse)?;
    }

    num_iterations += iterate_level(flows, &forward, &reverse, level, params)?;

    Ok(num_iterations)
}

fn estimate_initial_flow(data: &DataTerm, flow: &mut Flow) -> Result<(), FlowError> {
    let mut et = Grid::from_size_val(data.source.size(), 0.0);
    temporal_gradient(data.source, data.target, &mut et)?;
    initial_flow(&data.ex, &data.ey, &et, flow)
}

/// Run the fixed-point iterations of one pyramid level.
///
/// Each iteration refines the forward flow against the reverse one and then
/// the reverse flow against the forward flow as it was before that update. All
/// reads go to the current buffers and all writes to a second pair, swapped at
/// the end of the iteration.
///
/// # Arguments
///
/// * `flows` - The starting flows, replaced by the refined ones.
/// * `forward` - The data term of the forward direction.
/// * `reverse` - The data term of the reverse direction.
/// * `level` - The pyramid level, for logging.
/// * `params` - The estimation parameters.
///
/// # Returns
///
/// The number of iterations executed.
pub fn iterate_level(
    flows: &mut TwinFlow,
    forward: &DataTerm,
    reverse: &DataTerm,
    level: usize,
    params: &ProesmansParams,
) -> Result<usize, FlowError> {
    let size = flows.size();
    forward.source.check_same_size(reverse.source)?;
    flows.check_size(forward.source.size())?;

    log::debug!(
        "level {level}: {}x{}, {} iterations",
        size.width,
        size.height,
        params.max_iterations
    );

    let mut next = TwinFlow::zeros(size);
    let mut num_iterations = 0;

    for i in 0..params.max_iterations {
        let forward_consistency = consistency(&flows.forward, &flows.reverse, params.strategy)?;
        refine_flow(
            &flows.forward,
            &mut next.forward,
            forward,
            params.lambda,
            &forward_consistency,
            params.strategy,
        )?;
        fix_edges(&mut next.forward);

        // flows.forward still holds the value from before the update above
        let reverse_consistency = consistency(&flows.reverse, &flows.forward, params.strategy)?;
        refine_flow(
            &flows.reverse,
            &mut next.reverse,
            reverse,
            params.lambda,
            &reverse_consistency,
            params.strategy,
        )?;
        fix_edges(&mut next.reverse);

        std::mem::swap(flows, &mut next);

        num_iterations += 1;
        log::debug!("level {level}: iteration {i} done");
    }

    Ok(num_iterations)
}
