//! Input validation for assignment and dispatch.
//!
//! Checks structural integrity of tasks, machines, and mappings before
//! optimizing or dispatching. Detects:
//! - Duplicate task ids and machine names
//! - Machines with zero cores
//! - Difficulty indices outside [1, 10]
//! - Mappings that leave a task unassigned, reference unknown tasks, or
//!   name unknown machines
//!
//! All problems are collected rather than stopping at the first one.

use std::collections::HashSet;

use thiserror::Error;

use crate::models::{is_valid_difficulty, AssignmentMapping, Machine, Task};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same id or name.
    DuplicateId,
    /// A machine declares zero cores.
    InvalidCoreCount,
    /// A task's difficulty index is outside [1, 10].
    InvalidDifficulty,
    /// A task has no machine in the mapping.
    UnassignedTask,
    /// A mapping entry names a machine that doesn't exist.
    UnknownMachine,
    /// A mapping entry refers to a task that doesn't exist.
    UnknownTask,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates tasks and machines.
///
/// Checks:
/// 1. No duplicate machine names
/// 2. Every machine has at least one core
/// 3. No duplicate task ids
/// 4. Every difficulty index is in [1, 10]
pub fn validate_input(tasks: &[Task], machines: &[Machine]) -> ValidationResult {
    let mut errors = Vec::new();

    let mut names = HashSet::new();
    for m in machines {
        if !names.insert(m.name.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate machine name: {}", m.name),
            ));
        }
        if m.cores == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidCoreCount,
                format!("Machine '{}' has zero cores", m.name),
            ));
        }
    }

    let mut ids = HashSet::new();
    for t in tasks {
        if !ids.insert(t.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate task id: {}", t.id),
            ));
        }
        if !is_valid_difficulty(i64::from(t.index)) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDifficulty,
                format!("Task {} has difficulty {} outside 1-10", t.id, t.index),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates that a mapping assigns every task exactly once to a known machine.
pub fn validate_mapping(
    mapping: &AssignmentMapping,
    tasks: &[Task],
    machines: &[Machine],
) -> ValidationResult {
    let mut errors = Vec::new();
    let names: HashSet<&str> = machines.iter().map(|m| m.name.as_str()).collect();
    let ids: HashSet<usize> = tasks.iter().map(|t| t.id).collect();

    for t in tasks {
        if mapping.machine_for(t.id).is_none() {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnassignedTask,
                format!("Task {} has no assigned machine", t.id),
            ));
        }
    }

    for (task_id, machine) in mapping.iter() {
        if !ids.contains(&task_id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownTask,
                format!("Mapping references unknown task {task_id}"),
            ));
        }
        if !names.contains(machine) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownMachine,
                format!("Task {task_id} is assigned to unknown machine '{machine}'"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_machines() -> Vec<Machine> {
        vec![
            Machine::new("vm1", "10.0.0.1", 1),
            Machine::new("vm2", "10.0.0.2", 2),
        ]
    }

    fn sample_tasks() -> Vec<Task> {
        vec![Task::new(0, 3), Task::new(1, 7)]
    }

    #[test]
    fn test_valid_input() {
        assert!(validate_input(&sample_tasks(), &sample_machines()).is_ok());
    }

    #[test]
    fn test_duplicate_machine_name() {
        let machines = vec![Machine::new("vm1", "a", 1), Machine::new("vm1", "b", 2)];
        let errors = validate_input(&sample_tasks(), &machines).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("machine")));
    }

    #[test]
    fn test_zero_cores() {
        // Bypass the clamping constructor, as a deserialized config would.
        let mut m = Machine::new("vm1", "a", 1);
        m.cores = 0;
        let errors = validate_input(&sample_tasks(), &[m]).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidCoreCount));
    }

    #[test]
    fn test_duplicate_task_and_bad_difficulty() {
        let tasks = vec![Task::new(0, 3), Task::new(0, 11)];
        let errors = validate_input(&tasks, &sample_machines()).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId));
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidDifficulty));
    }

    #[test]
    fn test_valid_mapping() {
        let mapping = AssignmentMapping::new().with(0, "vm2").with(1, "vm1");
        assert!(validate_mapping(&mapping, &sample_tasks(), &sample_machines()).is_ok());
    }

    #[test]
    fn test_mapping_errors() {
        let mapping = AssignmentMapping::new().with(0, "vm9").with(5, "vm1");
        let errors = validate_mapping(&mapping, &sample_tasks(), &sample_machines()).unwrap_err();
        let kinds: Vec<_> = errors.iter().map(|e| e.kind.clone()).collect();
        assert!(kinds.contains(&ValidationErrorKind::UnassignedTask));
        assert!(kinds.contains(&ValidationErrorKind::UnknownTask));
        assert!(kinds.contains(&ValidationErrorKind::UnknownMachine));
        assert_eq!(errors.len(), 3);
    }
}
