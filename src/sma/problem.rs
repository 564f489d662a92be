//! Assignment problem definition.
//!
//! Bridges the domain models (tasks, machines) to the optimizer: the
//! objective is the estimated makespan of an assignment vector.

use super::candidate::Candidate;
use super::cost::estimate_vector;
use crate::error::{Result, SchedulerError};
use crate::models::{AssignmentMapping, Machine, Task};
use crate::validation::validate_input;

/// Task → machine assignment problem.
///
/// Owns the task and machine lists the optimizer searches over. Slot `j`
/// of every assignment vector refers to `tasks[j]`; slot values index
/// `machines`.
#[derive(Debug, Clone)]
pub struct AssignmentProblem {
    tasks: Vec<Task>,
    machines: Vec<Machine>,
}

impl AssignmentProblem {
    /// Creates a problem after validating the inputs.
    ///
    /// # Errors
    /// `NoTasks` / `NoMachines` for empty inputs, `Validation` for
    /// duplicate ids, zero cores, or out-of-range difficulties.
    pub fn new(tasks: Vec<Task>, machines: Vec<Machine>) -> Result<Self> {
        if tasks.is_empty() {
            return Err(SchedulerError::NoTasks);
        }
        if machines.is_empty() {
            return Err(SchedulerError::NoMachines);
        }
        validate_input(&tasks, &machines).map_err(SchedulerError::Validation)?;
        Ok(Self { tasks, machines })
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn machine_count(&self) -> usize {
        self.machines.len()
    }

    /// Objective: estimated makespan of an assignment vector.
    pub fn evaluate(&self, slots: &[usize]) -> f64 {
        estimate_vector(slots, &self.tasks, &self.machines)
    }

    /// Evaluates a candidate in place.
    pub fn evaluate_candidate(&self, candidate: &mut Candidate) {
        candidate.fitness = self.evaluate(&candidate.slots);
    }

    /// Decodes an assignment vector into a mapping.
    pub fn decode(&self, candidate: &Candidate) -> AssignmentMapping {
        candidate.decode(&self.tasks, &self.machines)
    }
}
