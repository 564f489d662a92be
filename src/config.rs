//! Cluster configuration.
//!
//! The machine table is an explicit value passed to the optimizer and the
//! dispatcher. It is loaded either from a JSON file or from the reference
//! four-machine layout with addresses taken from `VM1_IP`..`VM4_IP`.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dispatch::DispatchConfig;
use crate::error::{Result, SchedulerError};
use crate::models::Machine;
use crate::validation::validate_input;

/// Reference layout: (name, address variable, cores, memory GB).
const REFERENCE_MACHINES: [(&str, &str, u32, u32); 4] = [
    ("vm1", "VM1_IP", 1, 1),
    ("vm2", "VM2_IP", 2, 2),
    ("vm3", "VM3_IP", 4, 4),
    ("vm4", "VM4_IP", 8, 4),
];

/// Machines plus dispatch settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub machines: Vec<Machine>,
    #[serde(default = "default_worker_port")]
    pub worker_port: u16,
    #[serde(default = "default_timeout_secs")]
    pub task_timeout_secs: u64,
}

fn default_worker_port() -> u16 {
    DispatchConfig::default().worker_port
}

fn default_timeout_secs() -> u64 {
    DispatchConfig::default().task_timeout.as_secs()
}

impl ClusterConfig {
    /// Creates a config with default port and timeout.
    pub fn new(machines: Vec<Machine>) -> Self {
        Self {
            machines,
            worker_port: default_worker_port(),
            task_timeout_secs: default_timeout_secs(),
        }
    }

    /// Reference layout with addresses from `VM1_IP`..`VM4_IP`.
    ///
    /// # Errors
    /// `MissingAddress` naming the first unset variable.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reference layout with addresses from an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let machines = REFERENCE_MACHINES
            .iter()
            .map(|&(name, var, cores, memory_gb)| {
                let address = lookup(var)
                    .filter(|a| !a.trim().is_empty())
                    .ok_or_else(|| SchedulerError::MissingAddress(var.to_string()))?;
                Ok(Machine::new(name, address.trim(), cores).with_memory_gb(memory_gb))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(machines))
    }

    /// Loads a config from JSON.
    ///
    /// Accepts either a full `ClusterConfig` object or a bare list of machines.
    ///
    /// # Errors
    /// `NoMachines` for an empty table; `Validation` for zero-core machines
    /// or duplicate names.
    pub fn from_json_str(json: &str) -> Result<Self> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape {
            Full(ClusterConfig),
            Machines(Vec<Machine>),
        }

        let config = match serde_json::from_str::<Shape>(json)? {
            Shape::Full(config) => config,
            Shape::Machines(machines) => Self::new(machines),
        };
        if config.machines.is_empty() {
            return Err(SchedulerError::NoMachines);
        }
        validate_input(&[], &config.machines).map_err(SchedulerError::Validation)?;
        Ok(config)
    }

    /// Loads a config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Overrides the worker port.
    pub fn with_worker_port(mut self, port: u16) -> Self {
        self.worker_port = port;
        self
    }

    /// Overrides the per-task timeout.
    pub fn with_task_timeout_secs(mut self, secs: u64) -> Self {
        self.task_timeout_secs = secs;
        self
    }

    /// Dispatcher settings derived from this config.
    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig::default()
            .with_worker_port(self.worker_port)
            .with_task_timeout(Duration::from_secs(self.task_timeout_secs))
    }
}
