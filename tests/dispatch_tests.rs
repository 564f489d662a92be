//! Dispatch engine integration tests: concurrency ceilings, failure
//! isolation, timeouts, and a real HTTP round trip against the worker.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpListener;

use u_dispatch::dispatch::{DispatchConfig, DispatchEngine, HttpWorkerClient, WorkerClient};
use u_dispatch::models::{AssignmentMapping, Machine, Task, TaskOutcome, FAILED_SENTINEL};
use u_dispatch::worker::{router, WorkerState};
use u_dispatch::{DispatchError, SchedulerError};

/// Counts concurrent entries per machine and remembers the peak.
#[derive(Default)]
struct CountingWorker {
    in_flight: Mutex<HashMap<String, usize>>,
    peak: Mutex<HashMap<String, usize>>,
    calls: AtomicUsize,
    delay: Duration,
}

impl CountingWorker {
    fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    fn peak(&self, machine: &str) -> usize {
        self.peak.lock().unwrap().get(machine).copied().unwrap_or(0)
    }
}

#[async_trait]
impl WorkerClient for CountingWorker {
    async fn run_task(&self, machine: &Machine, _task: &Task) -> Result<(), DispatchError> {
        {
            let mut in_flight = self.in_flight.lock().unwrap();
            let current = in_flight.entry(machine.name.clone()).or_insert(0);
            *current += 1;
            let mut peak = self.peak.lock().unwrap();
            let p = peak.entry(machine.name.clone()).or_insert(0);
            *p = (*p).max(*current);
        }
        self.calls.fetch_add(1, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        *self
            .in_flight
            .lock()
            .unwrap()
            .get_mut(&machine.name)
            .unwrap() -= 1;
        Ok(())
    }
}

/// Fails every task whose id is in the list.
struct FlakyWorker {
    failing: Vec<usize>,
}

#[async_trait]
impl WorkerClient for FlakyWorker {
    async fn run_task(&self, _machine: &Machine, task: &Task) -> Result<(), DispatchError> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        if self.failing.contains(&task.id) {
            Err(DispatchError::Status(500))
        } else {
            Ok(())
        }
    }
}

/// Never answers task 0 in time.
struct StallingWorker;

#[async_trait]
impl WorkerClient for StallingWorker {
    async fn run_task(&self, _machine: &Machine, task: &Task) -> Result<(), DispatchError> {
        let delay = if task.id == 0 { 2_000 } else { 5 };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(())
    }
}

/// Panics on task 1.
struct PanickingWorker;

#[async_trait]
impl WorkerClient for PanickingWorker {
    async fn run_task(&self, _machine: &Machine, task: &Task) -> Result<(), DispatchError> {
        if task.id == 1 {
            panic!("worker stub blew up");
        }
        Ok(())
    }
}

fn cluster() -> Vec<Machine> {
    vec![
        Machine::new("vm1", "10.0.0.1", 1),
        Machine::new("vm2", "10.0.0.2", 2),
        Machine::new("vm3", "10.0.0.3", 4),
    ]
}

fn round_robin(tasks: &[Task], machines: &[Machine]) -> AssignmentMapping {
    tasks
        .iter()
        .map(|t| (t.id, machines[t.id % machines.len()].name.clone()))
        .collect()
}

#[tokio::test]
async fn test_concurrency_never_exceeds_cores() {
    let machines = cluster();
    let tasks: Vec<Task> = (0..30).map(|i| Task::new(i, 1)).collect();
    let mapping = round_robin(&tasks, &machines);

    let worker = Arc::new(CountingWorker::with_delay(Duration::from_millis(20)));
    let engine = DispatchEngine::new(worker.clone(), machines.clone());
    let report = engine.execute(&mapping, &tasks).await.unwrap();

    assert_eq!(report.records.len(), 30);
    assert_eq!(report.succeeded(), 30);
    assert_eq!(worker.calls.load(Ordering::SeqCst), 30);
    for m in &machines {
        let peak = worker.peak(&m.name);
        assert!(peak >= 1, "{} never ran", m.name);
        assert!(
            peak <= m.cores as usize,
            "{} peaked at {} with {} cores",
            m.name,
            peak,
            m.cores
        );
    }
    // Ten tasks on a four-core machine do run in parallel.
    assert!(worker.peak("vm3") > 1);
}

#[tokio::test]
async fn test_single_core_machine_queues() {
    let machines = vec![Machine::new("solo", "10.0.0.9", 1)];
    let tasks: Vec<Task> = (0..4).map(|i| Task::new(i, 2)).collect();
    let mapping = round_robin(&tasks, &machines);

    let worker = Arc::new(CountingWorker::with_delay(Duration::from_millis(15)));
    let report = DispatchEngine::new(worker.clone(), machines)
        .execute(&mapping, &tasks)
        .await
        .unwrap();

    assert_eq!(worker.peak("solo"), 1);
    // Every task but the first waited behind a sibling.
    let waited = report.records.iter().filter(|r| r.wait_secs > 0.005).count();
    assert!(waited >= 3);
    assert!(report.makespan_secs() >= 0.06);
}

#[tokio::test]
async fn test_failure_is_isolated() {
    let machines = cluster();
    let tasks: Vec<Task> = (0..6).map(|i| Task::new(i, 3)).collect();
    let mapping = round_robin(&tasks, &machines);

    let engine = DispatchEngine::new(Arc::new(FlakyWorker { failing: vec![2] }), machines);
    let report = engine.execute(&mapping, &tasks).await.unwrap();

    assert_eq!(report.records.len(), 6);
    assert_eq!(report.failed(), 1);
    let failed = &report.records[2];
    assert_eq!(failed.task_id, 2);
    assert_eq!(failed.exec_secs, FAILED_SENTINEL);
    assert_eq!(failed.wait_secs, FAILED_SENTINEL);
    assert!(matches!(
        failed.outcome,
        TaskOutcome::Failed { ref reason } if reason.contains("500")
    ));
    for r in report.records.iter().filter(|r| r.task_id != 2) {
        assert!(r.is_success());
        assert!(r.exec_secs > 0.0);
    }
}

#[tokio::test]
async fn test_timeout_releases_slot() {
    // One core: task 1 can only run after task 0's slot is released.
    let machines = vec![Machine::new("vm1", "10.0.0.1", 1)];
    let tasks = vec![Task::new(0, 1), Task::new(1, 1)];
    let mapping = round_robin(&tasks, &machines);

    let config = DispatchConfig::default().with_task_timeout(Duration::from_millis(50));
    let engine = DispatchEngine::new(Arc::new(StallingWorker), machines).with_config(config);
    let report = engine.execute(&mapping, &tasks).await.unwrap();

    let timed_out = report.records.iter().find(|r| r.task_id == 0).unwrap();
    let finished = report.records.iter().find(|r| r.task_id == 1).unwrap();

    assert!(!timed_out.is_success());
    assert_eq!(timed_out.exec_secs, FAILED_SENTINEL);
    assert!(matches!(
        timed_out.outcome,
        TaskOutcome::Failed { ref reason } if reason.contains("Timed out")
    ));
    assert!(finished.is_success());
    assert!(report.makespan_secs() < 1.5);
}

#[tokio::test]
async fn test_panicked_task_still_recorded() {
    let machines = cluster();
    let tasks: Vec<Task> = (0..3).map(|i| Task::new(i, 1)).collect();
    let mapping = round_robin(&tasks, &machines);

    let report = DispatchEngine::new(Arc::new(PanickingWorker), machines)
        .execute(&mapping, &tasks)
        .await
        .unwrap();

    assert_eq!(report.records.len(), 3);
    let lost = &report.records[1];
    assert_eq!(lost.task_id, 1);
    assert_eq!(lost.machine, "vm2");
    assert_eq!(lost.exec_secs, FAILED_SENTINEL);
    assert_eq!(report.succeeded(), 2);
}

#[tokio::test]
async fn test_http_round_trip_against_worker() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let app = router(WorkerState::new(2).with_matrix_size(2));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let machines = vec![Machine::new("local", "127.0.0.1", 2)];
    let client = HttpWorkerClient::new(port, Duration::from_secs(30)).unwrap();

    let health = client.check_health(&machines[0]).await.unwrap();
    assert!(health.status);

    let tasks = vec![Task::new(0, 1), Task::new(1, 2), Task::new(2, 4)];
    let mapping = round_robin(&tasks, &machines);
    let config = DispatchConfig::default().with_worker_port(port);
    let engine =
        DispatchEngine::new(Arc::new(client.clone()), machines.clone()).with_config(config);
    let report = engine.execute(&mapping, &tasks).await.unwrap();

    assert_eq!(report.succeeded(), 3);
    assert!(report.records.iter().all(|r| r.machine == "local"));

    // The worker answers an out-of-range index with 400.
    let err = client.run_task(&machines[0], &Task::new(3, 11)).await.unwrap_err();
    assert!(matches!(err, DispatchError::Status(400)));
}

#[tokio::test]
async fn test_zero_core_machine_rejected_before_dispatch() {
    let machines: Vec<Machine> =
        serde_json::from_str(r#"[{"name": "z", "address": "h", "cores": 0}]"#).unwrap();
    let tasks = vec![Task::new(0, 1)];
    let mapping = round_robin(&tasks, &machines);

    let worker = Arc::new(CountingWorker::with_delay(Duration::from_millis(1)));
    let engine = DispatchEngine::new(worker.clone(), machines);
    let result = tokio::time::timeout(Duration::from_secs(2), engine.execute(&mapping, &tasks))
        .await
        .expect("dispatch must return instead of waiting on a zero-core machine");

    assert!(matches!(result, Err(SchedulerError::Validation(_))));
    assert_eq!(worker.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unreachable_worker_fails_every_task() {
    // Bind then drop to get a port nothing listens on.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let machines = vec![Machine::new("gone", "127.0.0.1", 2)];
    let tasks = vec![Task::new(0, 1), Task::new(1, 1)];
    let mapping = round_robin(&tasks, &machines);

    let client = HttpWorkerClient::new(port, Duration::from_secs(5)).unwrap();
    let report = DispatchEngine::new(Arc::new(client), machines)
        .execute(&mapping, &tasks)
        .await
        .unwrap();

    assert_eq!(report.failed(), 2);
    assert!(report.records.iter().all(|r| r.exec_secs == FAILED_SENTINEL));
}
