//! Reference worker service.
//!
//! Implements the remote side of the dispatch contract:
//!
//! | Route | Behavior |
//! |-------|----------|
//! | `GET /health` | `{status, message, date}` |
//! | `GET /task/:index` | `index² × 10000` units of CPU work, split across cores |
//!
//! A unit of work is the determinant of a random square matrix. Work runs
//! on blocking threads so the async runtime keeps serving requests.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Local;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::models::{cpu_load, is_valid_difficulty};

/// Worker settings shared by all handlers.
#[derive(Debug, Clone)]
pub struct WorkerState {
    /// Threads the load is split across.
    pub cores: usize,
    /// Side length of the matrix in one unit of work.
    pub matrix_size: usize,
}

impl WorkerState {
    /// Creates a state with 40×40 matrices.
    pub fn new(cores: usize) -> Self {
        Self {
            cores: cores.max(1),
            matrix_size: 40,
        }
    }

    /// Sets the matrix side length (at least 1).
    pub fn with_matrix_size(mut self, size: usize) -> Self {
        self.matrix_size = size.max(1);
        self
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    pub status: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_cpu_load: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<String>,
}

impl TaskResponse {
    fn rejected(message: &str) -> Self {
        Self {
            status: false,
            message: message.to_string(),
            task: None,
            requested_cpu_load: None,
            execution_time: None,
        }
    }
}

/// Builds the worker router.
pub fn router(state: WorkerState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/task/:index", get(task_handler))
        .with_state(state)
}

/// Serves the worker until the listener fails.
pub async fn serve(addr: SocketAddr, state: WorkerState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, cores = state.cores, "Worker listening");
    axum::serve(listener, router(state)).await
}

async fn health_handler() -> Json<crate::dispatch::HealthStatus> {
    Json(crate::dispatch::HealthStatus {
        status: true,
        message: "Server is healthy".to_string(),
        date: Local::now().format("%d-%m-%Y %H:%M:%S").to_string(),
    })
}

async fn task_handler(
    State(state): State<WorkerState>,
    Path(raw): Path<String>,
) -> (StatusCode, Json<TaskResponse>) {
    let Ok(index) = raw.trim().parse::<i64>() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(TaskResponse::rejected("Index must be a number between 1 - 10")),
        );
    };
    if !is_valid_difficulty(index) {
        return (
            StatusCode::BAD_REQUEST,
            Json(TaskResponse::rejected("Index must be between 1 - 10")),
        );
    }

    let load = cpu_load(index as u8);
    let start = Instant::now();
    let result = tokio::task::spawn_blocking(move || simulate_load(load, &state)).await;
    let elapsed = format!("{:.4}s", start.elapsed().as_secs_f64());
    let task = format!("task-{index}");

    match result {
        Ok(_) => {
            tracing::info!(task = %task, cpu_load = load, elapsed = %elapsed, "Task simulated");
            (
                StatusCode::OK,
                Json(TaskResponse {
                    status: true,
                    message: format!("{task} run successfully"),
                    task: Some(task),
                    requested_cpu_load: Some(load),
                    execution_time: Some(elapsed),
                }),
            )
        }
        Err(e) => {
            tracing::error!(task = %task, error = %e, "Task simulation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(TaskResponse {
                    status: false,
                    message: format!("CPU task error: {e}"),
                    task: Some(task),
                    requested_cpu_load: Some(load),
                    execution_time: Some(elapsed),
                }),
            )
        }
    }
}

/// Runs `load` units split evenly over `state.cores` threads, each thread
/// doing at least one unit. Returns the number of units performed.
pub fn simulate_load(load: u64, state: &WorkerState) -> u64 {
    let per_core = (load / state.cores as u64).max(1);
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..state.cores)
            .map(|core| {
                let size = state.matrix_size;
                scope.spawn(move || {
                    let mut rng = SmallRng::seed_from_u64(core as u64);
                    let mut sink = 0.0;
                    for _ in 0..per_core {
                        sink += random_determinant(size, &mut rng);
                    }
                    std::hint::black_box(sink);
                    per_core
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap_or(0)).sum()
    })
}

/// Determinant of a random `n×n` matrix by Gaussian elimination with
/// partial pivoting.
fn random_determinant<R: Rng>(n: usize, rng: &mut R) -> f64 {
    let mut a: Vec<f64> = (0..n * n).map(|_| rng.random::<f64>()).collect();
    determinant(&mut a, n)
}

fn determinant(a: &mut [f64], n: usize) -> f64 {
    let mut det = 1.0;
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i * n + col].abs().total_cmp(&a[j * n + col].abs()))
            .unwrap_or(col);
        if a[pivot * n + col] == 0.0 {
            return 0.0;
        }
        if pivot != col {
            for k in 0..n {
                a.swap(pivot * n + k, col * n + k);
            }
            det = -det;
        }
        let p = a[col * n + col];
        det *= p;
        for row in col + 1..n {
            let factor = a[row * n + col] / p;
            for k in col..n {
                a[row * n + k] -= factor * a[col * n + k];
            }
        }
    }
    det
}
