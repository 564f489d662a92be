//! Remote worker clients.
//!
//! [`WorkerClient`] is the seam between the dispatcher and the network:
//! one call performs one task's unit of work on one machine. The
//! production implementation is [`HttpWorkerClient`]; tests plug in
//! instrumented stubs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::models::{Machine, Task};

/// Performs a task's unit of work on a machine.
#[async_trait]
pub trait WorkerClient: Send + Sync {
    /// Executes one task. `Ok` means the worker reported success.
    async fn run_task(&self, machine: &Machine, task: &Task) -> Result<(), DispatchError>;
}

/// Response body of a worker's `/health` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: bool,
    pub message: String,
    pub date: String,
}

/// HTTP worker client: `GET http://{address}:{port}/task/{index}`.
///
/// A single `reqwest::Client` (and its connection pool) is shared by every
/// concurrent task.
#[derive(Debug, Clone)]
pub struct HttpWorkerClient {
    client: Client,
    port: u16,
    timeout: Duration,
}

impl HttpWorkerClient {
    /// Creates a client targeting workers on `port`, with a per-request timeout.
    pub fn new(port: u16, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            port,
            timeout,
        })
    }

    pub fn task_url(&self, machine: &Machine, task: &Task) -> String {
        format!("{}/task/{}", machine.base_url(self.port), task.index)
    }

    /// Queries a machine's `/health` endpoint.
    pub async fn check_health(&self, machine: &Machine) -> Result<HealthStatus, DispatchError> {
        let url = format!("{}/health", machine.base_url(self.port));
        let status = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<HealthStatus>()
            .await?;
        Ok(status)
    }
}

#[async_trait]
impl WorkerClient for HttpWorkerClient {
    async fn run_task(&self, machine: &Machine, task: &Task) -> Result<(), DispatchError> {
        let url = self.task_url(machine, task);
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                DispatchError::Timeout(self.timeout)
            } else {
                DispatchError::from(e)
            }
        })?;
        response.error_for_status()?;
        Ok(())
    }
}
