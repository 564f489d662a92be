//! Optimizer configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the slime-mould optimizer.
///
/// # Example
/// ```
/// use u_dispatch::sma::SmaConfig;
///
/// let config = SmaConfig::default()
///     .with_population_size(30)
///     .with_max_iterations(500)
///     .with_seed(7);
/// assert_eq!(config.population_size, 30);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmaConfig {
    /// Number of candidates (P). At least 2: each update samples two
    /// distinct peers.
    pub population_size: usize,
    /// Iteration budget (I).
    pub max_iterations: usize,
    /// RNG seed. `None` seeds from the operating system.
    pub seed: Option<u64>,
}

impl Default for SmaConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            max_iterations: 5000,
            seed: None,
        }
    }
}

impl SmaConfig {
    /// Sets the population size (clamped to at least 2).
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size.max(2);
        self
    }

    /// Sets the iteration budget.
    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
