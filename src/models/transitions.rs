//! # Task Transitions
//!
//! Audit trail of status changes applied to a queued task. Every change the
//! queue accepts is appended, so the observed status path of a task can be
//! replayed and checked against the lifecycle rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state_machine::TaskStatus;

/// One applied status change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTransition {
    pub from: TaskStatus,
    pub to: TaskStatus,
    pub at: DateTime<Utc>,
}

impl TaskTransition {
    pub fn new(from: TaskStatus, to: TaskStatus, at: DateTime<Utc>) -> Self {
        Self { from, to, at }
    }

    /// Retry transitions put an active task back to pending
    pub fn is_retry(&self) -> bool {
        self.from == TaskStatus::Active && self.to == TaskStatus::Pending
    }

    pub fn is_terminal(&self) -> bool {
        self.to.is_terminal()
    }
}

/// Whether a recorded path is a valid walk through the task lifecycle
pub fn is_valid_path(transitions: &[TaskTransition]) -> bool {
    let mut current = TaskStatus::Pending;
    for transition in transitions {
        if transition.from != current || !current.can_transition_to(transition.to) {
            return false;
        }
        current = transition.to;
    }
    true
}
