//! Assignment mapping (task id → machine name).
//!
//! The decoded, externally meaningful form of an assignment vector.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Task-to-machine assignment, ordered by task id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentMapping {
    entries: BTreeMap<usize, String>,
}

impl AssignmentMapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a task to a machine, replacing any previous assignment.
    pub fn assign(&mut self, task_id: usize, machine: impl Into<String>) {
        self.entries.insert(task_id, machine.into());
    }

    /// Adds an assignment (builder form).
    pub fn with(mut self, task_id: usize, machine: impl Into<String>) -> Self {
        self.assign(task_id, machine);
        self
    }

    /// Machine assigned to a task.
    pub fn machine_for(&self, task_id: usize) -> Option<&str> {
        self.entries.get(&task_id).map(|s| s.as_str())
    }

    /// Iterates `(task_id, machine_name)` in task id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.entries.iter().map(|(&id, m)| (id, m.as_str()))
    }

    /// Task ids assigned to a machine.
    pub fn tasks_on<'a>(&'a self, machine: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.entries
            .iter()
            .filter(move |(_, m)| m.as_str() == machine)
            .map(|(&id, _)| id)
    }

    /// Number of assigned tasks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no task is assigned.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(usize, String)> for AssignmentMapping {
    fn from_iter<I: IntoIterator<Item = (usize, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
