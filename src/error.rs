//! Error types.
//!
//! [`SchedulerError`] covers run-level conditions (missing input, bad
//! configuration, invalid mappings). [`DispatchError`] covers a single
//! task's remote call and never escapes the dispatcher: it is folded into
//! the task's [`ExecutionRecord`](crate::models::ExecutionRecord).

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("No tasks to schedule")]
    NoTasks,

    #[error("No machines configured")]
    NoMachines,

    #[error("Dataset file not found: {0}")]
    DatasetNotFound(PathBuf),

    #[error("Environment variable {0} is not set")]
    MissingAddress(String),

    #[error("Invalid input: {}", format_validation(.0))]
    Validation(Vec<ValidationError>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Failure of one task's remote unit of work.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Worker returned HTTP {0}")]
    Status(u16),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Machine slot unavailable for '{0}'")]
    SlotClosed(String),

    #[error("Dispatch task aborted: {0}")]
    Aborted(String),
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => DispatchError::Status(status.as_u16()),
            None => DispatchError::Transport(err.to_string()),
        }
    }
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
