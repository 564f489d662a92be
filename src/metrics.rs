//! Load-balancing metrics from an observed run.
//!
//! Computed over successful records only (`exec_secs > 0`).
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan | Measured batch wall-clock interval |
//! | Throughput | successful / makespan |
//! | Imbalance degree | (max − min) / mean of per-machine total execution time |
//! | Resource utilization | Σ exec / (makespan × Σ cores) |
//! | Avg relative start/finish | Mean offset from the earliest successful start |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::models::{seconds_since, total_cores, ExecutionRecord, Machine};

/// Run-level performance indicators. All times are in seconds.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetrics {
    /// Number of successful tasks.
    pub completed_tasks: usize,
    /// Measured batch wall-clock interval.
    pub makespan_secs: f64,
    /// Successful tasks per second.
    pub throughput: f64,
    pub total_exec_secs: f64,
    pub total_wait_secs: f64,
    pub avg_exec_secs: f64,
    pub avg_wait_secs: f64,
    /// Mean start offset from the earliest successful start.
    pub avg_start_secs: f64,
    /// Mean finish offset from the earliest successful start.
    pub avg_finish_secs: f64,
    /// Normalized spread of per-machine total execution time.
    pub imbalance_degree: f64,
    /// Fraction of available core-time consumed (0.0..=1.0 in practice).
    pub resource_utilization: f64,
    /// Total execution time per machine with at least one success.
    pub exec_by_machine: BTreeMap<String, f64>,
}

impl RunMetrics {
    /// Computes metrics from a batch's records.
    ///
    /// Returns `None` when no record succeeded: the metrics are undefined.
    ///
    /// # Arguments
    /// * `records` - One record per task, successes and failures alike.
    /// * `machines` - All configured machines (for total core count).
    /// * `makespan_secs` - Measured batch wall-clock interval.
    pub fn calculate(
        records: &[ExecutionRecord],
        machines: &[Machine],
        makespan_secs: f64,
    ) -> Option<Self> {
        let successes: Vec<&ExecutionRecord> = records.iter().filter(|r| r.is_success()).collect();
        let origin = successes.iter().map(|r| r.started_at).min()?;
        let count = successes.len() as f64;

        let total_exec_secs: f64 = successes.iter().map(|r| r.exec_secs).sum();
        let total_wait_secs: f64 = successes.iter().map(|r| r.wait_secs).sum();
        let total_start: f64 = successes
            .iter()
            .map(|r| seconds_since(origin, r.started_at))
            .sum();
        let total_finish: f64 = successes
            .iter()
            .map(|r| seconds_since(origin, r.finished_at))
            .sum();

        let mut exec_by_machine: BTreeMap<String, f64> = BTreeMap::new();
        for r in &successes {
            *exec_by_machine.entry(r.machine.clone()).or_insert(0.0) += r.exec_secs;
        }

        let throughput = if makespan_secs > 0.0 {
            count / makespan_secs
        } else {
            0.0
        };

        let available = makespan_secs * f64::from(total_cores(machines));
        let resource_utilization = if available > 0.0 {
            total_exec_secs / available
        } else {
            0.0
        };

        Some(Self {
            completed_tasks: successes.len(),
            makespan_secs,
            throughput,
            total_exec_secs,
            total_wait_secs,
            avg_exec_secs: total_exec_secs / count,
            avg_wait_secs: total_wait_secs / count,
            avg_start_secs: total_start / count,
            avg_finish_secs: total_finish / count,
            imbalance_degree: imbalance_degree(&exec_by_machine),
            resource_utilization,
            exec_by_machine,
        })
    }
}

/// `(max − min) / mean` over per-machine loads; 0 when the mean is 0.
fn imbalance_degree(loads: &BTreeMap<String, f64>) -> f64 {
    if loads.is_empty() {
        return 0.0;
    }
    let max = loads.values().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = loads.values().copied().fold(f64::INFINITY, f64::min);
    let mean = loads.values().sum::<f64>() / loads.len() as f64;
    if mean > 0.0 {
        (max - min) / mean
    } else {
        0.0
    }
}

impl fmt::Display for RunMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Completed tasks           : {}", self.completed_tasks)?;
        writeln!(f, "Makespan                  : {:.4} s", self.makespan_secs)?;
        writeln!(f, "Throughput                : {:.4} tasks/s", self.throughput)?;
        writeln!(f, "Total CPU time            : {:.4} s", self.total_exec_secs)?;
        writeln!(f, "Total wait time           : {:.4} s", self.total_wait_secs)?;
        writeln!(f, "Average start time (rel)  : {:.4} s", self.avg_start_secs)?;
        writeln!(f, "Average execution time    : {:.4} s", self.avg_exec_secs)?;
        writeln!(f, "Average finish time (rel) : {:.4} s", self.avg_finish_secs)?;
        writeln!(f, "Imbalance degree          : {:.4}", self.imbalance_degree)?;
        write!(
            f,
            "Resource utilization      : {:.4}%",
            self.resource_utilization * 100.0
        )?;
        for (machine, secs) in &self.exec_by_machine {
            write!(f, "\n  {machine:<24}: {secs:.4} s")?;
        }
        Ok(())
    }
}
