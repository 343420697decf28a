use rayon::prelude::*;
use thiserror::Error;

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),

    /// The row stride must be valid.
    #[error("row stride must be > 0")]
    InvalidRowStride(usize),

    /// Paired buffers do not have the same length.
    #[error("paired row buffers must have the same length")]
    SizeMismatch,
}

/// Controls how the per-row work of an operation is executed.
///
/// Every strategy writes each output row from exactly one task and produces
/// the same values, so the choice only affects speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStrategy {
    /// Run sequentially on the current thread.
    ///
    /// Useful for small images, debugging, or when the overhead of parallelization
    /// outweighs the benefits.
    #[default]
    Serial,

    /// Use the global Rayon thread pool to process rows in parallel.
    ParallelRows,

    /// Run on a local thread pool with `n` threads.
    ///
    /// # Warning
    /// Creates a new thread pool on every call, which has significant overhead.
    /// Use this primarily for benchmarking or specific isolation needs.
    Fixed(usize),
}

/// Apply `op(y, row)` to every row of `dst`.
///
/// # Arguments
///
/// * `strategy` - The execution strategy.
/// * `width` - The row stride of `dst`.
/// * `dst` - The row-major destination buffer.
/// * `op` - The operation receiving the row index and the mutable row.
pub fn for_each_row<F>(
    strategy: ExecutionStrategy,
    width: usize,
    dst: &mut [f32],
    op: F,
) -> Result<(), ParallelError>
where
    F: Fn(usize, &mut [f32]) + Send + Sync,
{
    if width == 0 {
        return Err(ParallelError::InvalidRowStride(width));
    }

    match strategy {
        ExecutionStrategy::Serial => {
            dst.chunks_exact_mut(width)
                .enumerate()
                .for_each(|(y, row)| op(y, row));
        }
        ExecutionStrategy::ParallelRows => {
            dst.par_chunks_exact_mut(width)
                .enumerate()
                .for_each(|(y, row)| op(y, row));
        }
        ExecutionStrategy::Fixed(n) => {
            let pool = build_pool(n)?;
            pool.install(|| {
                dst.par_chunks_exact_mut(width)
                    .enumerate()
                    .for_each(|(y, row)| op(y, row));
            });
        }
    }

    Ok(())
}

/// Apply `op(y, row_a, row_b)` to every pair of rows of two co-registered buffers.
///
/// # Arguments
///
/// * `strategy` - The execution strategy.
/// * `width` - The row stride shared by both buffers.
/// * `dst_a` - The first row-major destination buffer.
/// * `dst_b` - The second row-major destination buffer.
/// * `op` - The operation receiving the row index and both mutable rows.
pub fn for_each_row_pair<F>(
    strategy: ExecutionStrategy,
    width: usize,
    dst_a: &mut [f32],
    dst_b: &mut [f32],
    op: F,
) -> Result<(), ParallelError>
where
    F: Fn(usize, &mut [f32], &mut [f32]) + Send + Sync,
{
    if width == 0 {
        return Err(ParallelError::InvalidRowStride(width));
    }

    if dst_a.len() != dst_b.len() {
        return Err(ParallelError::SizeMismatch);
    }

    match strategy {
        ExecutionStrategy::Serial => {
            dst_a
                .chunks_exact_mut(width)
                .zip(dst_b.chunks_exact_mut(width))
                .enumerate()
                .for_each(|(y, (row_a, row_b))| op(y, row_a, row_b));
        }
        ExecutionStrategy::ParallelRows => {
            dst_a
                .par_chunks_exact_mut(width)
                .zip(dst_b.par_chunks_exact_mut(width))
                .enumerate()
                .for_each(|(y, (row_a, row_b))| op(y, row_a, row_b));
        }
        ExecutionStrategy::Fixed(n) => {
            let pool = build_pool(n)?;
            pool.install(|| {
                dst_a
                    .par_chunks_exact_mut(width)
                    .zip(dst_b.par_chunks_exact_mut(width))
                    .enumerate()
                    .for_each(|(y, (row_a, row_b))| op(y, row_a, row_b));
            });
        }
    }

    Ok(())
}

fn build_pool(n: usize) -> Result<rayon::ThreadPool, ParallelError> {
    if n == 0 {
        return Err(ParallelError::InvalidThreadCount(n));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(n)
        .build()
        .map_err(|e| ParallelError::BuildError(e.to_string()))
}
