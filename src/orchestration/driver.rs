//! # Task Queue Driver
//!
//! Single control loop that advances every queued task. Each pass visits
//! tasks in insertion order:
//!
//! 1. flagged for deletion: clean up (once), then unlink
//! 2. past its deadline while non-terminal: clean up, then `Stopped`
//! 3. `Pending`: make `Active`, then begin processing
//! 4. `Active` and not waiting on an activity: evaluate progress
//!
//! Between passes the loop sleeps for the configured tick, and stops at the
//! next pass boundary once [`TaskQueueDriver::stop`] is called. Handler
//! failures end up in task status; nothing a handler does stops the loop.

use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::progress::ProgressHandle;
use super::task_queue::{TaskQueue, VisitPlan};
use crate::error::{Result, TaskerError};
use crate::identifier::Identifier;
use crate::logging::log_error;
use crate::models::Task;
use crate::registry::{TaskContext, TaskHandler};
use crate::state_machine::HandlerOutcome;

/// What one pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub visited: usize,
    pub processed: usize,
    pub evaluated: usize,
    pub expired: usize,
    pub removed: usize,
}

#[derive(Debug, Clone)]
pub struct TaskQueueDriver {
    queue: Arc<TaskQueue>,
    tick: Duration,
    shutdown: Arc<Notify>,
    handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl TaskQueueDriver {
    pub fn new(queue: Arc<TaskQueue>, tick: Duration) -> Self {
        Self {
            queue,
            tick,
            shutdown: Arc::new(Notify::new()),
            handle: Arc::new(Mutex::new(None)),
        }
    }

    pub fn queue(&self) -> &Arc<TaskQueue> {
        &self.queue
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Spawn the driver loop on the current tokio runtime
    #[instrument(skip(self))]
    pub fn start(&self) -> Result<()> {
        let mut handle = self.handle.lock();
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            return Err(TaskerError::InvalidState(
                "Task queue driver is already running".to_string(),
            ));
        }

        info!(tick_ms = self.tick.as_millis() as u64, "🚀 TASK_QUEUE: Starting driver loop");
        let driver = self.clone();
        *handle = Some(tokio::spawn(async move { driver.run_loop().await }));
        Ok(())
    }

    /// Signal the loop to stop and wait for it to exit
    #[instrument(skip(self))]
    pub async fn stop(&self) -> Result<()> {
        let handle = self.handle.lock().take();
        let Some(handle) = handle else {
            info!("TASK_QUEUE: Driver already stopped");
            return Ok(());
        };

        info!("🛑 TASK_QUEUE: Stopping driver loop");
        self.shutdown.notify_one();
        handle.await.map_err(|e| {
            error!(error = %e, "Driver loop ended abnormally");
            TaskerError::InvalidState(format!("Driver loop ended abnormally: {e}"))
        })?;
        info!("✅ TASK_QUEUE: Driver loop stopped");
        Ok(())
    }

    async fn run_loop(&self) {
        loop {
            let summary = self.run_pass().await;
            if summary.visited > 0 {
                debug!(?summary, "Driver pass complete");
            }

            tokio::select! {
                _ = tokio::time::sleep(self.tick) => {}
                _ = self.shutdown.notified() => {
                    info!("Task queue driver loop shutting down");
                    break;
                }
            }
        }
    }

    /// Visit every task once, in queue order
    pub async fn run_pass(&self) -> PassSummary {
        let mut summary = PassSummary::default();
        for id in self.queue.task_ids() {
            summary.visited += 1;
            self.visit(&id, &mut summary).await;
        }
        summary
    }

    async fn visit(&self, id: &Identifier, summary: &mut PassSummary) {
        let Some(plan) = self.queue.plan_visit(id, Utc::now()) else {
            return;
        };

        match plan {
            VisitPlan::Remove { task, clean } => {
                if clean {
                    self.clean(task).await;
                }
                self.queue.unlink(id);
                summary.removed += 1;
            }
            VisitPlan::Expire(task) => {
                self.clean(task).await;
                self.queue.finish_expiry(id, Utc::now());
                summary.expired += 1;
            }
            VisitPlan::Process(task) => {
                let outcome = match self.handler_for(&task) {
                    Some(handler) => handler.process(self.context(task)).await,
                    None => HandlerOutcome::Failure,
                };
                debug!(task_id = %id, %outcome, "Begin-processing finished");
                self.queue.apply_process_outcome(id, outcome, Utc::now());
                summary.processed += 1;
            }
            VisitPlan::Evaluate(task) => {
                let outcome = match self.handler_for(&task) {
                    Some(handler) => handler.evaluate(self.context(task)).await,
                    None => HandlerOutcome::NoChange,
                };
                self.queue.apply_evaluate_outcome(id, outcome, Utc::now());
                summary.evaluated += 1;
            }
        }
    }

    async fn clean(&self, task: Task) {
        let task_id = task.id;
        let Some(handler) = self.queue.registry().get(task.task_type) else {
            warn!(task_id = %task_id, task_type = %task.task_type, "No handler to clean task, assuming nothing to release");
            return;
        };
        let outcome = handler.clean(self.context(task)).await;
        if outcome.is_failure() {
            warn!(task_id = %task_id, "Task clean-up reported failure");
        }
    }

    fn handler_for(&self, task: &Task) -> Option<Arc<dyn TaskHandler>> {
        let handler = self.queue.registry().get(task.task_type);
        if handler.is_none() {
            log_error(
                "task_queue_driver",
                "resolve_handler",
                &format!("No handler registered for {}", task.task_type),
                Some(&task.id.to_string()),
            );
        }
        handler
    }

    fn context(&self, task: Task) -> TaskContext {
        let progress = ProgressHandle::new(&self.queue, task.id);
        TaskContext::new(task, progress)
    }
}
