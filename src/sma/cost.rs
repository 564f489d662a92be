//! Cost estimator: estimated makespan of an assignment.
//!
//! Each machine processes its assigned load linearly, sped up by its core
//! count; the makespan is the slowest machine's finish time:
//!
//! ```text
//! C_max = max_m Σ_{t assigned to m} load(t) / cores(m)
//! ```
//!
//! Pure and deterministic. Division is always safe because `cores >= 1`.
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use std::collections::HashMap;

use crate::models::{AssignmentMapping, Machine, Task};

/// Estimated makespan of a decoded mapping.
///
/// Tasks missing from the mapping, or mapped to an unknown machine,
/// contribute nothing. Returns 0.0 when no machine carries load.
pub fn estimate_makespan(mapping: &AssignmentMapping, tasks: &[Task], machines: &[Machine]) -> f64 {
    let mut loads: HashMap<&str, (f64, f64)> = machines
        .iter()
        .map(|m| (m.name.as_str(), (0.0, f64::from(m.cores))))
        .collect();

    for task in tasks {
        let Some(name) = mapping.machine_for(task.id) else {
            continue;
        };
        if let Some((load, cores)) = loads.get_mut(name) {
            *load += task.cpu_load as f64 / *cores;
        }
    }

    loads.values().map(|&(load, _)| load).fold(0.0, f64::max)
}

/// Estimated makespan of an assignment vector.
///
/// `slots[j]` is the machine index for `tasks[j]`. Equivalent to decoding
/// the vector and calling [`estimate_makespan`], without the name lookups.
pub fn estimate_vector(slots: &[usize], tasks: &[Task], machines: &[Machine]) -> f64 {
    let mut loads = vec![0.0_f64; machines.len()];
    for (task, &slot) in tasks.iter().zip(slots) {
        if let (Some(load), Some(machine)) = (loads.get_mut(slot), machines.get(slot)) {
            *load += task.cpu_load as f64 / f64::from(machine.cores);
        }
    }
    loads.into_iter().fold(0.0, f64::max)
}
