//! Domain models.
//!
//! | Type | Role |
//! |------|------|
//! | [`Machine`] | Remote worker with a core count (speed-up and concurrency ceiling) |
//! | [`Task`] | Unit of CPU work keyed by a difficulty index |
//! | [`AssignmentMapping`] | Decoded task → machine assignment |
//! | [`ExecutionRecord`] | Per-task dispatch telemetry |

mod machine;
mod mapping;
mod record;
mod task;

pub use machine::{total_cores, Machine};
pub use mapping::AssignmentMapping;
pub use record::{seconds_since, ExecutionRecord, TaskOutcome, FAILED_SENTINEL};
pub use task::{cpu_load, is_valid_difficulty, Task, MAX_DIFFICULTY, MIN_DIFFICULTY};
