//! Task model.
//!
//! A task is one unit of remote CPU work, keyed by a difficulty index in
//! [1, 10]. Its CPU load is `index² × 10000`, a deterministic function of
//! the index alone.

use serde::{Deserialize, Serialize};

/// Smallest accepted difficulty index.
pub const MIN_DIFFICULTY: u8 = 1;
/// Largest accepted difficulty index.
pub const MAX_DIFFICULTY: u8 = 10;

/// A task to be assigned and executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Zero-based position in the loaded task list.
    pub id: usize,
    /// Human-readable name.
    pub name: String,
    /// Difficulty index in [1, 10].
    pub index: u8,
    /// CPU load magnitude (`index² × 10000`).
    pub cpu_load: u64,
}

impl Task {
    /// Creates a task named `task-{index}-{id}`.
    pub fn new(id: usize, index: u8) -> Self {
        Self {
            id,
            name: format!("task-{index}-{id}"),
            index,
            cpu_load: cpu_load(index),
        }
    }

    /// Sets the task name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// CPU load for a difficulty index.
#[inline]
pub fn cpu_load(index: u8) -> u64 {
    let i = u64::from(index);
    i * i * 10_000
}

/// Whether a raw value is an accepted difficulty index.
#[inline]
pub fn is_valid_difficulty(value: i64) -> bool {
    (i64::from(MIN_DIFFICULTY)..=i64::from(MAX_DIFFICULTY)).contains(&value)
}
