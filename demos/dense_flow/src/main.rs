use argh::FromArgs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use proesmans_flow::{
    compute_flow,
    external::{flow_from_external, flow_to_external},
    parallel::ExecutionStrategy,
    Flow, FlowError, ProesmansParams, TwinFlow,
};
use proesmans_image::{ImageSize, Picture};

#[derive(FromArgs)]
/// Estimate the dense optical flow between two frames
struct Args {
    /// path to the first frame
    #[argh(option)]
    frame1: PathBuf,

    /// path to the second frame
    #[argh(option)]
    frame2: PathBuf,

    /// number of iterations per pyramid level
    #[argh(option, default = "50")]
    iterations: usize,

    /// smoothing parameter of the data term
    #[argh(option, default = "30.0")]
    lambda: f32,

    /// number of pyramid levels below full resolution
    #[argh(option, default = "4")]
    levels: usize,

    /// process the image rows on all cores
    #[argh(switch)]
    parallel: bool,

    /// path of a json flow report, as written by `-o`, used as the initial estimate
    #[argh(option)]
    seed: Option<PathBuf>,

    /// path of the json file receiving the flows
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,
}

#[derive(Serialize, Deserialize)]
struct FlowReport {
    width: usize,
    height: usize,
    levels: usize,
    max_iterations: usize,
    lambda: f32,
    num_iterations: usize,
    /// u plane followed by v plane, row-major
    forward: Vec<f32>,
    reverse: Vec<f32>,
}

fn read_frame(path: &Path) -> Result<Picture, Box<dyn std::error::Error>> {
    let rgb = image::open(path)?.to_rgb8();
    let size = ImageSize {
        width: rgb.width() as usize,
        height: rgb.height() as usize,
    };
    Ok(Picture::from_interleaved_u8(rgb.as_raw(), size, 3)?)
}

/// Rebuild the flows of a report as a seed for frames of extents `size`.
fn seed_from_report(report: &FlowReport, size: ImageSize) -> Result<TwinFlow, FlowError> {
    let report_size = ImageSize {
        width: report.width,
        height: report.height,
    };
    let seed = TwinFlow::new(
        flow_from_external(&report.forward, report_size)?,
        flow_from_external(&report.reverse, report_size)?,
    )?;
    seed.check_size(size)?;
    Ok(seed)
}

fn read_seed(path: &Path, size: ImageSize) -> Result<TwinFlow, Box<dyn std::error::Error>> {
    let file = std::fs::File::open(path)?;
    let report: FlowReport = serde_json::from_reader(std::io::BufReader::new(file))?;
    Ok(seed_from_report(&report, size)?)
}

fn mean_magnitude(flow: &Flow) -> f32 {
    let sum = flow
        .u()
        .as_slice()
        .iter()
        .zip(flow.v().as_slice())
        .map(|(u, v)| (u * u + v * v).sqrt())
        .sum::<f32>();
    sum / flow.size().area() as f32
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let p1 = read_frame(&args.frame1)?;
    let p2 = read_frame(&args.frame2)?;
    log::info!("loaded two frames of {}x{}", p1.width(), p1.height());

    let strategy = if args.parallel {
        ExecutionStrategy::ParallelRows
    } else {
        ExecutionStrategy::Serial
    };
    let params = ProesmansParams::default()
        .with_max_iterations(args.iterations)
        .with_lambda(args.lambda)
        .with_levels(args.levels)
        .with_strategy(strategy);

    let seed = match &args.seed {
        Some(path) => {
            let seed = read_seed(path, p1.size())?;
            log::info!("seeded with the flows of {}", path.display());
            Some(seed)
        }
        None => None,
    };

    let now = std::time::Instant::now();
    let result = compute_flow(&p1, &p2, &params, seed.as_ref())?;
    log::info!(
        "{} iterations in {:?}, mean displacement forward {:.3} px, reverse {:.3} px",
        result.num_iterations,
        now.elapsed(),
        mean_magnitude(&result.flows.forward),
        mean_magnitude(&result.flows.reverse)
    );

    let Some(output) = args.output else {
        return Ok(());
    };

    let report = FlowReport {
        width: p1.width(),
        height: p1.height(),
        levels: params.levels,
        max_iterations: params.max_iterations,
        lambda: params.lambda,
        num_iterations: result.num_iterations,
        forward: flow_to_external(&result.flows.forward)?,
        reverse: flow_to_external(&result.flows.reverse)?,
    };

    let file = std::fs::File::create(&output)?;
    serde_json::to_writer(std::io::BufWriter::new(file), &report)?;
    log::info!("flows written to {}", output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(width: usize, height: usize) -> FlowReport {
        let area = width * height;
        FlowReport {
            width,
            height,
            levels: 0,
            max_iterations: 0,
            lambda: 30.0,
            num_iterations: 0,
            forward: (0..2 * area).map(|i| i as f32 * 0.5).collect(),
            reverse: (0..2 * area).map(|i| -(i as f32)).collect(),
        }
    }

    #[test]
    fn test_seed_from_report() -> Result<(), Box<dyn std::error::Error>> {
        let size = ImageSize {
            width: 4,
            height: 3,
        };
        let json = serde_json::to_string(&report(4, 3))?;
        let parsed: FlowReport = serde_json::from_str(&json)?;

        let seed = seed_from_report(&parsed, size)?;
        assert_eq!(seed.size(), size);
        // u plane first, then v plane
        assert_eq!(seed.forward.at(1, 0), (0.5, 6.5));
        assert_eq!(seed.reverse.at(3, 2), (-11.0, -23.0));
        assert_eq!(flow_to_external::<f32>(&seed.forward)?, parsed.forward);

        Ok(())
    }

    #[test]
    fn test_seed_size_mismatch() {
        let size = ImageSize {
            width: 4,
            height: 3,
        };
        let err = seed_from_report(&report(3, 4), size).err();
        assert_eq!(
            err,
            Some(FlowError::FlowSizeMismatch {
                expected: size,
                actual: ImageSize {
                    width: 3,
                    height: 4
                },
            })
        );
    }

    #[test]
    fn test_seed_truncated_planes() {
        let size = ImageSize {
            width: 4,
            height: 3,
        };
        let mut report = report(4, 3);
        report.reverse.pop();
        assert_eq!(
            seed_from_report(&report, size).err(),
            Some(FlowError::InvalidFlowShape(23, 24))
        );
    }
}
