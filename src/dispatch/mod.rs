//! Concurrency-bounded dispatch of an assignment to remote workers.
//!
//! # Concurrency model
//!
//! Every task is started at once on the tokio runtime. A per-machine
//! semaphore with `cores` permits is the only admission control: a task
//! suspends until its machine has a free slot, then suspends again on the
//! network call. Permits are released on drop, so success, error, and
//! timeout paths all free the slot. Semaphores are fair (FIFO), so no
//! waiting task starves while slots keep being released.
//!
//! There is no cancellation: once issued, a request runs to completion
//! or to its timeout.

mod client;
mod engine;

pub use client::{HealthStatus, HttpWorkerClient, WorkerClient};
pub use engine::{DispatchConfig, DispatchEngine, DispatchReport};
