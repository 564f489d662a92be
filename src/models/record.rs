//! Execution records produced by the dispatcher.
//!
//! One record per task, created once and never mutated. Failed tasks carry
//! [`FAILED_SENTINEL`] for both execution and wait time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Time value recorded for a failed task.
pub const FAILED_SENTINEL: f64 = -1.0;

/// Outcome of a task's remote unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    /// Worker reported success.
    Completed,
    /// Transport error, non-success response, or timeout.
    Failed { reason: String },
}

/// Per-task execution telemetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Task id.
    pub task_id: usize,
    /// Task name.
    pub task_name: String,
    /// Assigned machine name.
    pub machine: String,
    /// Wall-clock start of the remote call (or time of failure).
    pub started_at: DateTime<Utc>,
    /// Wall-clock end of the remote call (or time of failure).
    pub finished_at: DateTime<Utc>,
    /// Seconds spent waiting for a machine slot, or `FAILED_SENTINEL`.
    pub wait_secs: f64,
    /// Seconds from call start to response, or `FAILED_SENTINEL`.
    pub exec_secs: f64,
    /// Success or failure.
    pub outcome: TaskOutcome,
}

impl ExecutionRecord {
    /// Creates a record for a completed task.
    pub fn completed(
        task_id: usize,
        task_name: impl Into<String>,
        machine: impl Into<String>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        wait_secs: f64,
        exec_secs: f64,
    ) -> Self {
        Self {
            task_id,
            task_name: task_name.into(),
            machine: machine.into(),
            started_at,
            finished_at,
            wait_secs,
            exec_secs,
            outcome: TaskOutcome::Completed,
        }
    }

    /// Creates a record for a failed task with sentinel times.
    pub fn failed(
        task_id: usize,
        task_name: impl Into<String>,
        machine: impl Into<String>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            task_id,
            task_name: task_name.into(),
            machine: machine.into(),
            started_at,
            finished_at,
            wait_secs: FAILED_SENTINEL,
            exec_secs: FAILED_SENTINEL,
            outcome: TaskOutcome::Failed {
                reason: reason.into(),
            },
        }
    }

    /// Whether this record counts toward metrics (`exec_secs > 0`).
    #[inline]
    pub fn is_success(&self) -> bool {
        self.exec_secs > 0.0
    }
}

/// Seconds from `origin` to `t` (negative if `t` is earlier).
pub fn seconds_since(origin: DateTime<Utc>, t: DateTime<Utc>) -> f64 {
    let delta = t - origin;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1e6,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}
