//! Machine (worker) model.
//!
//! A machine is a remote worker that executes tasks. Its core count is both
//! the speed-up divisor in the cost model and the concurrency ceiling the
//! dispatcher enforces.

use serde::{Deserialize, Serialize};

/// A worker machine.
///
/// Immutable once loaded; lives for the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    /// Unique machine name.
    pub name: String,
    /// Network address (host or IP) of the worker.
    pub address: String,
    /// Number of CPU cores (>= 1).
    pub cores: u32,
    /// Memory capacity in GB.
    #[serde(default)]
    pub memory_gb: u32,
}

impl Machine {
    /// Creates a machine. Core count is clamped to at least 1.
    pub fn new(name: impl Into<String>, address: impl Into<String>, cores: u32) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            cores: cores.max(1),
            memory_gb: 0,
        }
    }

    /// Sets the memory capacity.
    pub fn with_memory_gb(mut self, memory_gb: u32) -> Self {
        self.memory_gb = memory_gb;
        self
    }

    /// Base URL of the worker service on the given port.
    pub fn base_url(&self, port: u16) -> String {
        format!("http://{}:{}", self.address, port)
    }
}

/// Sum of core counts across machines.
pub fn total_cores(machines: &[Machine]) -> u32 {
    machines.iter().map(|m| m.cores).sum()
}
