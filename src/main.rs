use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use u_dispatch::config::ClusterConfig;
use u_dispatch::dataset::load_tasks;
use u_dispatch::dispatch::{DispatchEngine, HttpWorkerClient};
use u_dispatch::metrics::RunMetrics;
use u_dispatch::models::Task;
use u_dispatch::report::write_results_file;
use u_dispatch::sma::{AssignmentProblem, SmaConfig, SmaResult, SmaRunner};
use u_dispatch::worker::{self, WorkerState};
use u_dispatch::{Result, SchedulerError};

/// Assignments printed before dispatch.
const PREVIEW_LEN: usize = 10;

#[derive(Parser, Debug)]
#[command(name = "u-dispatch")]
#[command(version)]
#[command(about = "Slime-mould task assignment with concurrency-bounded dispatch")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Optimize, dispatch to the workers, and report metrics
    Run {
        #[command(flatten)]
        optimize: OptimizeArgs,

        #[command(flatten)]
        cluster: ClusterArgs,

        /// CSV file for per-task results
        #[arg(long, env = "RESULTS_FILE", default_value = "sma_results.csv")]
        results: PathBuf,
    },

    /// Optimize only and print the mapping as JSON
    Plan {
        #[command(flatten)]
        optimize: OptimizeArgs,

        #[command(flatten)]
        cluster: ClusterArgs,
    },

    /// Serve the reference worker
    Worker {
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0:5000")]
        bind: SocketAddr,

        /// Threads to split each task's load across (defaults to all cores)
        #[arg(long)]
        cores: Option<usize>,

        /// Matrix side length for one unit of work
        #[arg(long, default_value = "40")]
        matrix_size: usize,
    },

    /// Check every configured machine's /health endpoint
    Health {
        #[command(flatten)]
        cluster: ClusterArgs,
    },
}

#[derive(Args, Debug)]
struct OptimizeArgs {
    /// Task dataset, one difficulty index (1-10) per line
    #[arg(long, env = "DATASET_FILE", default_value = "dataset.txt")]
    dataset: PathBuf,

    /// Iteration budget
    #[arg(long, default_value = "5000")]
    iterations: usize,

    /// Population size
    #[arg(long, default_value = "50")]
    population: usize,

    /// RNG seed for a reproducible search
    #[arg(long)]
    seed: Option<u64>,
}

impl OptimizeArgs {
    fn sma_config(&self) -> SmaConfig {
        let config = SmaConfig::default()
            .with_population_size(self.population)
            .with_max_iterations(self.iterations);
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }
}

#[derive(Args, Debug)]
struct ClusterArgs {
    /// JSON machine table; without it, addresses come from VM1_IP..VM4_IP
    #[arg(long, env = "MACHINES_FILE")]
    machines: Option<PathBuf>,

    /// Worker port (overrides the machine table)
    #[arg(long, env = "WORKER_PORT")]
    port: Option<u16>,

    /// Per-task timeout in seconds (overrides the machine table)
    #[arg(long)]
    timeout: Option<u64>,
}

impl ClusterArgs {
    fn load(&self) -> Result<ClusterConfig> {
        let mut config = match &self.machines {
            Some(path) => ClusterConfig::from_json_file(path)?,
            None => ClusterConfig::from_env()?,
        };
        if let Some(port) = self.port {
            config = config.with_worker_port(port);
        }
        if let Some(secs) = self.timeout {
            config = config.with_task_timeout_secs(secs);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Run {
            optimize,
            cluster,
            results,
        } => run(&optimize, &cluster, &results).await,
        Commands::Plan { optimize, cluster } => plan(&optimize, &cluster),
        Commands::Worker {
            bind,
            cores,
            matrix_size,
        } => serve_worker(bind, cores, matrix_size).await,
        Commands::Health { cluster } => health(&cluster).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn optimize(args: &OptimizeArgs, cluster: &ClusterConfig) -> Result<(Vec<Task>, SmaResult)> {
    let tasks = load_tasks(&args.dataset)?.tasks;
    if tasks.is_empty() {
        return Err(SchedulerError::NoTasks);
    }

    let problem = AssignmentProblem::new(tasks, cluster.machines.clone())?;
    let result = SmaRunner::run(&problem, &args.sma_config());
    println!(
        "Estimated makespan: {:.4} (initial {:.4})",
        result.best_fitness(),
        result.initial_fitness
    );
    Ok((problem.tasks().to_vec(), result))
}

async fn run(args: &OptimizeArgs, cluster_args: &ClusterArgs, results: &Path) -> Result<()> {
    let cluster = cluster_args.load()?;
    let (tasks, result) = optimize(args, &cluster)?;

    println!("First {PREVIEW_LEN} assignments:");
    for (task_id, machine) in result.mapping.iter().take(PREVIEW_LEN) {
        println!("  task {task_id:>4} -> {machine}");
    }

    let dispatch = cluster.dispatch_config();
    let client = HttpWorkerClient::new(dispatch.worker_port, dispatch.task_timeout)?;
    let engine =
        DispatchEngine::new(Arc::new(client), cluster.machines.clone()).with_config(dispatch);
    let report = engine.execute(&result.mapping, &tasks).await?;

    let written = write_results_file(&report.records, results)?;
    if written > 0 {
        println!("Wrote {written} rows to {}", results.display());
    }

    match RunMetrics::calculate(&report.records, &cluster.machines, report.makespan_secs()) {
        Some(metrics) => println!("\n{metrics}"),
        None => println!("No successful tasks; nothing to report"),
    }
    Ok(())
}

fn plan(args: &OptimizeArgs, cluster_args: &ClusterArgs) -> Result<()> {
    let cluster = cluster_args.load()?;
    let (_, result) = optimize(args, &cluster)?;
    println!("{}", serde_json::to_string_pretty(&result.mapping)?);
    Ok(())
}

async fn serve_worker(bind: SocketAddr, cores: Option<usize>, matrix_size: usize) -> Result<()> {
    let cores = cores
        .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
        .unwrap_or(1);
    let state = WorkerState::new(cores).with_matrix_size(matrix_size);
    worker::serve(bind, state).await?;
    Ok(())
}

async fn health(cluster_args: &ClusterArgs) -> Result<()> {
    let cluster = cluster_args.load()?;
    let client = HttpWorkerClient::new(cluster.worker_port, Duration::from_secs(5))?;

    for machine in &cluster.machines {
        match client.check_health(machine).await {
            Ok(status) => println!(
                "{:<8} {:<16} ok    {} ({})",
                machine.name, machine.address, status.message, status.date
            ),
            Err(e) => println!("{:<8} {:<16} DOWN  {e}", machine.name, machine.address),
        }
    }
    Ok(())
}
