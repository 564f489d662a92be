//! End-to-end: dataset → optimizer → dispatch → metrics → CSV.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use u_dispatch::dataset::{parse_tasks, SkipReason};
use u_dispatch::dispatch::{DispatchEngine, WorkerClient};
use u_dispatch::metrics::RunMetrics;
use u_dispatch::models::{Machine, Task};
use u_dispatch::report::write_results;
use u_dispatch::sma::{estimate_makespan, AssignmentProblem, SmaConfig, SmaRunner};
use u_dispatch::validation::validate_mapping;
use u_dispatch::{DispatchError, SchedulerError};

/// Sleeps in proportion to the task's load divided by the machine's cores.
struct ScaledWorker;

#[async_trait]
impl WorkerClient for ScaledWorker {
    async fn run_task(&self, machine: &Machine, task: &Task) -> Result<(), DispatchError> {
        let micros = task.cpu_load / 100 / u64::from(machine.cores);
        tokio::time::sleep(Duration::from_micros(micros.max(100))).await;
        Ok(())
    }
}

fn machines() -> Vec<Machine> {
    vec![
        Machine::new("vm1", "10.0.0.1", 1),
        Machine::new("vm2", "10.0.0.2", 2),
        Machine::new("vm3", "10.0.0.3", 4),
        Machine::new("vm4", "10.0.0.4", 8),
    ]
}

#[tokio::test]
async fn test_full_pipeline() {
    let load = parse_tasks(Cursor::new("3\n7\n11\nx\n5\n2\n9\n1\n4\n")).unwrap();
    assert_eq!(load.tasks.len(), 7);
    assert_eq!(load.skipped.len(), 2);
    assert_eq!(load.skipped[0].reason, SkipReason::OutOfRange(11));

    let machines = machines();
    let problem = AssignmentProblem::new(load.tasks.clone(), machines.clone()).unwrap();
    let config = SmaConfig::default()
        .with_population_size(20)
        .with_max_iterations(200)
        .with_seed(42);
    let result = SmaRunner::run(&problem, &config);

    assert!(validate_mapping(&result.mapping, &load.tasks, &machines).is_ok());
    assert!(result.best_fitness() <= result.initial_fitness);
    let estimated = estimate_makespan(&result.mapping, &load.tasks, &machines);
    assert!((estimated - result.best_fitness()).abs() < 1e-10);

    let engine = DispatchEngine::new(Arc::new(ScaledWorker), machines.clone());
    let report = engine.execute(&result.mapping, &load.tasks).await.unwrap();
    assert_eq!(report.records.len(), 7);
    assert_eq!(report.succeeded(), 7);
    for r in &report.records {
        assert_eq!(Some(r.machine.as_str()), result.mapping.machine_for(r.task_id));
    }

    let metrics =
        RunMetrics::calculate(&report.records, &machines, report.makespan_secs()).unwrap();
    assert_eq!(metrics.completed_tasks, 7);
    assert!(metrics.throughput > 0.0);
    assert!(metrics.imbalance_degree >= 0.0);
    assert!(metrics.resource_utilization > 0.0);

    let mut csv = Vec::new();
    let rows = write_results(&report.records, &mut csv).unwrap();
    assert_eq!(rows, 7);
    let text = String::from_utf8(csv).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("index,task_name,machine,start_time,exec_time,finish_time,wait_time")
    );
    assert_eq!(lines.count(), 7);
    assert!(text.contains("task-3-0"));
}

#[test]
fn test_empty_dataset_stops_before_optimizing() {
    let load = parse_tasks(Cursor::new("x\n42\n")).unwrap();
    assert!(load.tasks.is_empty());
    assert!(matches!(
        AssignmentProblem::new(load.tasks, machines()),
        Err(SchedulerError::NoTasks)
    ));
}

#[tokio::test]
async fn test_all_failed_run_has_nothing_to_report() {
    struct DownWorker;

    #[async_trait]
    impl WorkerClient for DownWorker {
        async fn run_task(&self, _: &Machine, _: &Task) -> Result<(), DispatchError> {
            Err(DispatchError::Transport("connection refused".to_string()))
        }
    }

    let tasks = vec![Task::new(0, 2), Task::new(1, 3)];
    let machines = machines();
    let problem = AssignmentProblem::new(tasks.clone(), machines.clone()).unwrap();
    let config = SmaConfig::default().with_max_iterations(10).with_seed(1);
    let result = SmaRunner::run(&problem, &config);

    let report = DispatchEngine::new(Arc::new(DownWorker), machines.clone())
        .execute(&result.mapping, &tasks)
        .await
        .unwrap();

    assert_eq!(report.failed(), 2);
    assert!(RunMetrics::calculate(&report.records, &machines, report.makespan_secs()).is_none());

    // Failed rows are still exported with their sentinels.
    let mut csv = Vec::new();
    assert_eq!(write_results(&report.records, &mut csv).unwrap(), 2);
    assert!(String::from_utf8(csv).unwrap().contains("-1.000000"));
}
