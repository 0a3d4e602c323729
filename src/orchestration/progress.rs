//! Late progress reports from activities launched by a handler.
//!
//! A handler whose begin-processing starts concurrent work returns
//! [`HandlerOutcome::Pending`](crate::state_machine::HandlerOutcome::Pending).
//! The task then stays active without being evaluated until the activity
//! calls [`ProgressHandle::resume`] or [`ProgressHandle::fail`], or settles
//! its last subsystem call through [`ProgressHandle::settle`]. Reports
//! against a task that already reached a terminal status, or was removed,
//! are ignored.

use chrono::Utc;
use std::sync::{Arc, Weak};
use tracing::debug;

use super::task_queue::TaskQueue;
use crate::identifier::Identifier;

#[derive(Debug, Clone)]
pub struct ProgressHandle {
    queue: Weak<TaskQueue>,
    task_id: Identifier,
}

impl ProgressHandle {
    pub fn new(queue: &Arc<TaskQueue>, task_id: Identifier) -> Self {
        Self {
            queue: Arc::downgrade(queue),
            task_id,
        }
    }

    /// Handle that reports nowhere, for calling handlers outside a queue
    pub fn detached(task_id: Identifier) -> Self {
        Self {
            queue: Weak::new(),
            task_id,
        }
    }

    pub fn task_id(&self) -> Identifier {
        self.task_id
    }

    /// The activity finished its part; the task may be evaluated again
    pub fn resume(&self) -> bool {
        match self.queue.upgrade() {
            Some(queue) => queue.resume_task(&self.task_id),
            None => {
                debug!(task_id = %self.task_id, "Task queue gone, resume dropped");
                false
            }
        }
    }

    /// Run the activity's final step only if the task still waits on it.
    ///
    /// The step's result resumes (`true`) or fails (`false`) the task.
    /// `None` means the task timed out, finished or was removed first and the
    /// step never ran.
    pub fn settle(&self, step: impl FnOnce() -> bool) -> Option<bool> {
        match self.queue.upgrade() {
            Some(queue) => queue.settle_activity(&self.task_id, Utc::now(), step),
            None => {
                debug!(task_id = %self.task_id, "Task queue gone, step skipped");
                None
            }
        }
    }

    /// The activity failed; the task becomes failed unless already finished
    pub fn fail(&self) -> bool {
        match self.queue.upgrade() {
            Some(queue) => queue.fail_task(&self.task_id, Utc::now()),
            None => {
                debug!(task_id = %self.task_id, "Task queue gone, failure dropped");
                false
            }
        }
    }
}
