//! Concurrency-bounded dispatch engine.
//!
//! # Algorithm
//!
//! 1. Validate the mapping (every task assigned once, known machines).
//! 2. Create one semaphore per machine with `cores` permits.
//! 3. Spawn every task at once. Each task waits for a permit on its
//!    machine, calls the worker under a timeout, and releases the permit
//!    on drop, whichever way the call ends.
//! 4. Join all tasks; any task lost to a panic gets a failed record.
//!
//! The batch makespan is measured on the monotonic clock from just before
//! the first spawn to just after the last join.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::client::WorkerClient;
use crate::error::{DispatchError, Result, SchedulerError};
use crate::models::{AssignmentMapping, ExecutionRecord, Machine, Task};
use crate::validation::{validate_input, validate_mapping};

/// Dispatcher settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Upper bound on a single remote call.
    pub task_timeout: Duration,
    /// Port the worker service listens on.
    pub worker_port: u16,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            task_timeout: Duration::from_secs(300),
            worker_port: 5000,
        }
    }
}

impl DispatchConfig {
    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub fn with_worker_port(mut self, port: u16) -> Self {
        self.worker_port = port;
        self
    }
}

/// Outcome of one dispatched batch.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    /// One record per task, ordered by task id.
    pub records: Vec<ExecutionRecord>,
    /// Monotonic wall-clock span of the whole batch.
    pub batch_duration: Duration,
}

impl DispatchReport {
    /// Batch makespan in seconds.
    pub fn makespan_secs(&self) -> f64 {
        self.batch_duration.as_secs_f64()
    }

    pub fn succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.records.len() - self.succeeded()
    }
}

/// Executes an assignment against remote workers.
///
/// At most `machine.cores` requests are in flight per machine. A task's
/// failure is recorded and never affects its siblings.
#[derive(Clone)]
pub struct DispatchEngine {
    client: Arc<dyn WorkerClient>,
    machines: Vec<Machine>,
    config: DispatchConfig,
}

impl DispatchEngine {
    /// Creates an engine with the default configuration.
    pub fn new(client: Arc<dyn WorkerClient>, machines: Vec<Machine>) -> Self {
        Self {
            client,
            machines,
            config: DispatchConfig::default(),
        }
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Dispatches every task to its assigned machine and waits for all.
    ///
    /// # Errors
    /// `Validation` if a machine has zero cores, a task is malformed, or the
    /// mapping does not assign every task exactly once to a known machine.
    /// Per-task failures are never errors here; they come back as failed
    /// records.
    pub async fn execute(
        &self,
        mapping: &AssignmentMapping,
        tasks: &[Task],
    ) -> Result<DispatchReport> {
        validate_input(tasks, &self.machines)
            .and_then(|()| validate_mapping(mapping, tasks, &self.machines))
            .map_err(SchedulerError::Validation)?;

        let slots: HashMap<&str, (&Machine, Arc<Semaphore>)> = self
            .machines
            .iter()
            .map(|m| (m.name.as_str(), (m, Arc::new(Semaphore::new(m.cores as usize)))))
            .collect();

        info!(tasks = tasks.len(), machines = self.machines.len(), "Dispatching tasks");

        let mut join_set = JoinSet::new();
        let batch_start = Instant::now();

        for task in tasks {
            let assigned = mapping.machine_for(task.id).and_then(|name| slots.get(name));
            debug_assert!(assigned.is_some(), "validated mapping lost task {}", task.id);
            let Some((machine, slot)) = assigned else {
                continue;
            };
            join_set.spawn(run_task(
                Arc::clone(&self.client),
                Machine::clone(machine),
                task.clone(),
                Arc::clone(slot),
                self.config.task_timeout,
            ));
        }

        let mut records = Vec::with_capacity(tasks.len());
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(record) => records.push(record),
                Err(e) => warn!(error = %e, "Dispatch task did not complete"),
            }
        }
        let batch_duration = batch_start.elapsed();

        // Tasks lost to a panic or abort still get exactly one record.
        let seen: HashSet<usize> = records.iter().map(|r| r.task_id).collect();
        for task in tasks.iter().filter(|t| !seen.contains(&t.id)) {
            let now = Utc::now();
            let machine = mapping.machine_for(task.id).unwrap_or_default();
            let reason = DispatchError::Aborted(format!("task {} never reported", task.id));
            records.push(ExecutionRecord::failed(
                task.id,
                &task.name,
                machine,
                now,
                now,
                reason.to_string(),
            ));
        }
        records.sort_by_key(|r| r.task_id);

        let report = DispatchReport {
            records,
            batch_duration,
        };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            makespan_secs = report.makespan_secs(),
            "All tasks finished"
        );
        Ok(report)
    }
}

/// Runs one task: wait for a slot, call the worker, record telemetry.
async fn run_task(
    client: Arc<dyn WorkerClient>,
    machine: Machine,
    task: Task,
    slot: Arc<Semaphore>,
    timeout: Duration,
) -> ExecutionRecord {
    let ready = Instant::now();
    let permit = match slot.acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            let now = Utc::now();
            let reason = DispatchError::SlotClosed(machine.name.clone());
            warn!(task_id = task.id, machine = %machine.name, error = %reason, "Task failed");
            return ExecutionRecord::failed(
                task.id,
                task.name,
                machine.name,
                now,
                now,
                reason.to_string(),
            );
        }
    };
    let wait = ready.elapsed();

    info!(task_id = task.id, task = %task.name, machine = %machine.name, "Executing task");
    let started_at = Utc::now();
    let call_start = Instant::now();
    let outcome = match tokio::time::timeout(timeout, client.run_task(&machine, &task)).await {
        Ok(result) => result,
        Err(_) => Err(DispatchError::Timeout(timeout)),
    };
    let exec = call_start.elapsed();
    let finished_at = Utc::now();
    drop(permit);

    match outcome {
        Ok(()) => {
            info!(
                task_id = task.id,
                machine = %machine.name,
                exec_secs = exec.as_secs_f64(),
                wait_secs = wait.as_secs_f64(),
                "Task finished"
            );
            ExecutionRecord::completed(
                task.id,
                task.name,
                machine.name,
                started_at,
                finished_at,
                wait.as_secs_f64(),
                exec.as_secs_f64(),
            )
        }
        Err(e) => {
            warn!(task_id = task.id, machine = %machine.name, error = %e, "Task failed");
            ExecutionRecord::failed(
                task.id,
                task.name,
                machine.name,
                started_at,
                finished_at,
                e.to_string(),
            )
        }
    }
}
