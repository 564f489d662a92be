//! Slime-mould assignment optimizer.
//!
//! Searches the discrete space of task → machine assignments, minimizing
//! the estimated makespan from [`estimate_makespan`].
//!
//! # Encoding
//!
//! An assignment vector holds one machine index per task. Continuous
//! position updates are rounded and clamped back onto the machine alphabet
//! after every move, so every vector always decodes to a complete mapping.
//!
//! # Submodules
//!
//! - `cost`: the estimated-makespan objective
//! - `candidate`: assignment vector + fitness, discretization
//! - `runner`: the iteration state machine and driver
//!
//! # Reference
//! Li et al. (2020), "Slime mould algorithm: A new method for stochastic
//! optimization"

mod candidate;
mod config;
mod cost;
mod problem;
mod runner;

pub use candidate::{discretize, Candidate};
pub use config::SmaConfig;
pub use cost::{estimate_makespan, estimate_vector};
pub use problem::AssignmentProblem;
pub use runner::{SlimeMould, SmaResult, SmaRunner};
