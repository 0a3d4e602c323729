//! The capability set every task type implements.

use async_trait::async_trait;
use serde_json::Value;

use super::task_type::TaskType;
use crate::error::Result;
use crate::models::{Task, TaskSnapshot};
use crate::orchestration::ProgressHandle;
use crate::state_machine::HandlerOutcome;

/// What a handler operation gets to work with: a copy of the task as the
/// driver saw it, and a handle for reporting late progress
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub task: Task,
    pub progress: ProgressHandle,
}

impl TaskContext {
    pub fn new(task: Task, progress: ProgressHandle) -> Self {
        Self { task, progress }
    }

    pub fn attributes(&self) -> &Value {
        &self.task.attributes
    }
}

/// Describe, validate, begin, evaluate and clean up one type of task.
///
/// The driver never holds the task queue's region while awaiting these, so
/// handlers may call back into the queue through their progress handle.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    fn task_type(&self) -> TaskType;

    /// Caller-facing snapshot; override to redact secrets
    fn describe(&self, task: &Task) -> TaskSnapshot {
        task.snapshot()
    }

    /// Check the request attributes before the task is queued
    fn validate(&self, attributes: &Value) -> Result<()>;

    /// Begin processing a pending task
    async fn process(&self, ctx: TaskContext) -> HandlerOutcome;

    /// Check on an active task
    async fn evaluate(&self, _ctx: TaskContext) -> HandlerOutcome {
        HandlerOutcome::Success
    }

    /// Release whatever the task acquired; nothing to release by default
    async fn clean(&self, _ctx: TaskContext) -> HandlerOutcome {
        HandlerOutcome::Success
    }
}
