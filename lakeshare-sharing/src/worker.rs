//! Task queue consumer.
//!
//! Tasks are enqueued by the share workflow (or by a scheduler for
//! refreshes) and executed here against the orchestrator. Two modes:
//! - `process_task` / `enqueue_and_wait`: run one task inline and return
//!   its outcome
//! - `run`: the polling loop, stopped through a `TaskWorkerHandle`

use crate::context::SharingContext;
use crate::error::{ShareError, ShareResult};
use crate::orchestrator::{approve_share, refresh_shares, revoke_share};
use lakeshare_types::{ShareUri, Task};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub const ACTION_APPROVE: &str = "ecs.share.approve";
pub const ACTION_REVOKE: &str = "ecs.share.revoke";
pub const ACTION_REFRESH: &str = "ecs.share.refresh";

/// Commands accepted by a running worker loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerCommand {
    /// Drain pending tasks now instead of waiting for the next tick.
    Poll,
    Stop,
}

/// Handle for sending commands to a running `TaskWorker`.
#[derive(Clone)]
pub struct TaskWorkerHandle {
    command_tx: mpsc::Sender<WorkerCommand>,
}

impl TaskWorkerHandle {
    pub async fn stop(&self) -> ShareResult<()> {
        self.send(WorkerCommand::Stop).await
    }

    pub async fn poll_now(&self) -> ShareResult<()> {
        self.send(WorkerCommand::Poll).await
    }

    async fn send(&self, cmd: WorkerCommand) -> ShareResult<()> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| ShareError::InvalidOperation("task worker not running".to_string()))
    }
}

pub struct TaskWorker {
    ctx: SharingContext,
    command_rx: mpsc::Receiver<WorkerCommand>,
    poll_interval: Duration,
    batch_size: usize,
}

/// Creates a task worker and its command handle.
pub fn create_task_worker(
    ctx: SharingContext,
    poll_interval: Duration,
    batch_size: usize,
) -> (TaskWorkerHandle, TaskWorker) {
    let (command_tx, command_rx) = mpsc::channel(16);
    let handle = TaskWorkerHandle { command_tx };
    let worker = TaskWorker {
        ctx,
        command_rx,
        poll_interval,
        batch_size: batch_size.max(1),
    };
    (handle, worker)
}

/// Share the task acts on. The payload wins over the task target.
fn share_uri_of(task: &Task) -> ShareUri {
    task.payload
        .get("shareUri")
        .and_then(Value::as_str)
        .map(ShareUri::from)
        .unwrap_or_else(|| ShareUri::from(task.target_uri.as_str()))
}

impl TaskWorker {
    pub fn context(&self) -> &SharingContext {
        &self.ctx
    }

    /// Runs one task's action and returns the response to record. Does not
    /// touch the task's status.
    pub async fn process_task(&self, task: &Task) -> ShareResult<Value> {
        debug!(task_uri = %task.uri, action = %task.action, "processing task");
        match task.action.as_str() {
            ACTION_APPROVE => {
                let uri = share_uri_of(task);
                let succeeded = approve_share(&self.ctx, &uri).await?;
                Ok(json!({ "shareUri": uri, "succeeded": succeeded }))
            }
            ACTION_REVOKE => {
                let uri = share_uri_of(task);
                let succeeded = revoke_share(&self.ctx, &uri).await?;
                Ok(json!({ "shareUri": uri, "succeeded": succeeded }))
            }
            ACTION_REFRESH => {
                let summary = refresh_shares(&self.ctx).await?;
                Ok(json!(summary))
            }
            other => Err(ShareError::UnknownTaskAction(other.to_string())),
        }
    }

    /// Processes a task and records the outcome. Returns the task as stored
    /// afterwards. Only a failure to record escapes.
    pub async fn execute(&self, task: &Task) -> ShareResult<Task> {
        match self.process_task(task).await {
            Ok(response) => {
                self.ctx.store.complete_task(&task.uri, response)?;
            }
            Err(e) => {
                error!(task_uri = %task.uri, action = %task.action, "task failed: {e}");
                self.ctx
                    .store
                    .fail_task(&task.uri, json!({ "message": e.to_string() }))?;
            }
        }
        Ok(self.ctx.store.get_task(&task.uri)?)
    }

    /// Enqueues a task and executes it right away, bypassing the queue order.
    pub async fn enqueue_and_wait(
        &self,
        target_uri: &str,
        action: &str,
        payload: Value,
    ) -> ShareResult<Task> {
        let task = self.ctx.store.enqueue_task(target_uri, action, payload)?;
        self.execute(&task).await
    }

    /// Claims and executes up to `batch_size` pending tasks. Returns how
    /// many ran.
    pub async fn run_once(&self) -> ShareResult<usize> {
        let mut processed = 0;
        while processed < self.batch_size {
            let Some(task) = self.ctx.store.claim_next_task()? else {
                break;
            };
            self.execute(&task).await?;
            processed += 1;
        }
        if processed > 0 {
            info!(processed, "task batch finished");
        }
        Ok(processed)
    }

    /// Runs the worker loop until stopped.
    pub async fn run(&mut self) {
        info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            batch_size = self.batch_size,
            "task worker started"
        );

        let mut poll_interval = tokio::time::interval(self.poll_interval);
        // Skip first immediate tick
        poll_interval.tick().await;

        loop {
            tokio::select! {
                _ = poll_interval.tick() => {
                    if let Err(e) = self.run_once().await {
                        warn!("task poll failed: {e}");
                    }
                }
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(WorkerCommand::Poll) => {
                            if let Err(e) = self.run_once().await {
                                warn!("task poll failed: {e}");
                            }
                        }
                        Some(WorkerCommand::Stop) => {
                            info!("task worker stopping");
                            break;
                        }
                        None => {
                            info!("command channel closed, stopping task worker");
                            break;
                        }
                    }
                }
            }
        }

        info!("task worker stopped");
    }
}
