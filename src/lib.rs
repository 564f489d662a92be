//! Task-to-machine assignment and concurrency-bounded remote dispatch.
//!
//! Assigns a fixed batch of CPU tasks to a heterogeneous pool of worker
//! machines with a slime-mould metaheuristic, executes the assignment
//! against the real workers while honoring each machine's core count as a
//! concurrency ceiling, and derives load-balancing metrics from the run.
//!
//! # Pipeline
//!
//! ```text
//! dataset ─▶ sma (optimize) ─▶ dispatch (execute) ─▶ metrics / report
//! ```
//!
//! Each stage runs to completion before the next starts; nothing feeds back.
//!
//! # Modules
//!
//! - **`models`**: `Machine`, `Task`, `AssignmentMapping`, `ExecutionRecord`
//! - **`sma`**: cost estimator and slime-mould optimizer
//! - **`dispatch`**: worker clients and the per-machine bounded dispatcher
//! - **`metrics`**: makespan, throughput, imbalance degree, utilization
//! - **`dataset`** / **`report`** / **`config`**: input, CSV output, machine table
//! - **`validation`**: input and mapping integrity checks
//! - **`worker`**: reference worker service
//!
//! # References
//!
//! - Li et al. (2020), "Slime mould algorithm: A new method for stochastic
//!   optimization"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"

pub mod config;
pub mod dataset;
pub mod dispatch;
pub mod error;
pub mod metrics;
pub mod models;
pub mod report;
pub mod sma;
pub mod validation;
pub mod worker;

pub use error::{DispatchError, Result, SchedulerError};
