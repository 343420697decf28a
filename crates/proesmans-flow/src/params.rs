use crate::{error::FlowError, parallel::ExecutionStrategy};

/// Configuration of the flow estimation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProesmansParams {
    /// Number of relaxation iterations run at every pyramid level.
    pub max_iterations: usize,
    /// Smoothing parameter of the data term. Larger values follow the image
    /// intensities more closely, smaller values give smoother flows.
    pub lambda: f32,
    /// Number of pyramid levels below full resolution. `0` runs at full
    /// resolution only.
    pub levels: usize,
    /// How the per-row work of each iteration is executed.
    pub strategy: ExecutionStrategy,
}

impl Default for ProesmansParams {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            lambda: 30.0,
            levels: 4,
            strategy: ExecutionStrategy::Serial,
        }
    }
}

impl ProesmansParams {
    /// Set the number of iterations per level.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the smoothing parameter.
    pub fn with_lambda(mut self, lambda: f32) -> Self {
        self.lambda = lambda;
        self
    }

    /// Set the number of pyramid levels.
    pub fn with_levels(mut self, levels: usize) -> Self {
        self.levels = levels;
        self
    }

    /// Set the execution strategy.
    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Total number of relaxation iterations a run with these parameters executes.
    pub fn total_iterations(&self) -> usize {
        self.max_iterations * (self.levels + 1)
    }

    /// Check the parameters that do not depend on the input frames.
    ///
    /// # Errors
    ///
    /// If `lambda` is not finite or not strictly positive, an error is returned.
    pub fn validate(&self) -> Result<(), FlowError> {
        if !self.lambda.is_finite() || self.lambda <= 0.0 {
            return Err(FlowError::InvalidLambda(self.lambda));
        }
        Ok(())
    }
}
