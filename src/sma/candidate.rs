//! Assignment vector with its fitness.
//!
//! # Encoding
//!
//! `slots[j]` is the machine index (into the problem's machine list) for
//! the j-th task. Every entry is always in `[0, machine_count)`, so no task
//! is ever unassigned.

use rand::Rng;

use crate::models::{AssignmentMapping, Machine, Task};

/// One population member: an assignment vector and its estimated makespan.
///
/// Lower fitness = better assignment (minimization convention).
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Machine index per task.
    pub slots: Vec<usize>,
    /// Estimated makespan (lower = better).
    pub fitness: f64,
}

impl Candidate {
    /// Creates an unevaluated candidate from a slot vector.
    pub fn new(slots: Vec<usize>) -> Self {
        Self {
            slots,
            fitness: f64::INFINITY,
        }
    }

    /// Draws each task's machine slot uniformly from `[0, machine_count)`.
    pub fn random<R: Rng>(task_count: usize, machine_count: usize, rng: &mut R) -> Self {
        let slots = (0..task_count)
            .map(|_| rng.random_range(0..machine_count))
            .collect();
        Self::new(slots)
    }

    /// Decodes the vector into a task id → machine name mapping.
    ///
    /// `tasks` and `machines` must be the lists the vector was built over.
    pub fn decode(&self, tasks: &[Task], machines: &[Machine]) -> AssignmentMapping {
        tasks
            .iter()
            .zip(&self.slots)
            .filter_map(|(task, &slot)| machines.get(slot).map(|m| (task.id, m.name.clone())))
            .collect()
    }

    /// Whether every slot is a valid machine index for `machine_count`.
    pub fn is_valid(&self, task_count: usize, machine_count: usize) -> bool {
        self.slots.len() == task_count && self.slots.iter().all(|&s| s < machine_count)
    }
}

/// Rounds a continuous position to the nearest machine index and clamps it
/// into `[0, machine_count - 1]`.
///
/// Ties round to even. Far out-of-range values land on the boundary indices.
#[inline]
pub fn discretize(value: f64, machine_count: usize) -> usize {
    let max = machine_count.saturating_sub(1) as f64;
    value.round_ties_even().clamp(0.0, max) as usize
}
