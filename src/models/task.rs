//! # Task Model
//!
//! In-memory representation of one queued asynchronous operation.
//!
//! ## Overview
//!
//! A `Task` is created by the task queue from a [`TaskRequest`] and owned by
//! the queue until the driver unlinks it. Callers never hold a `Task`
//! directly; they read clones or [`TaskSnapshot`]s.
//!
//! ## Snapshot Shape
//!
//! ```json
//! {
//!   "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
//!   "type": "addThreadDeviceTask",
//!   "attributes": { "timeout": 60, "status": "active", "...": "..." },
//!   "created": 1700000000,
//!   "timeout": 1700000060
//! }
//! ```
//!
//! `timeout` is `null` when the task has no deadline.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{attributes, status_groups};
use crate::identifier::Identifier;
use crate::models::transitions::TaskTransition;
use crate::registry::TaskType;
use crate::state_machine::TaskStatus;

/// Parsed task-creation request handed in by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(default)]
    pub attributes: Value,
}

impl TaskRequest {
    pub fn new(task_type: impl Into<String>, attributes: Value) -> Self {
        Self {
            task_type: task_type.into(),
            attributes,
        }
    }

    /// Requested timeout in seconds, when present and numeric
    pub fn timeout_seconds(&self) -> Option<f64> {
        timeout_seconds(&self.attributes)
    }
}

pub(crate) fn timeout_seconds(attributes: &Value) -> Option<f64> {
    attributes.get(attributes::TIMEOUT).and_then(Value::as_f64)
}

/// A queued task and its lifecycle bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Identifier,
    pub task_type: TaskType,
    pub attributes: Value,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    /// Absolute deadline; `None` means the task never times out
    pub timeout_at: Option<DateTime<Utc>>,
    pub last_evaluated_at: Option<DateTime<Utc>>,
    pub delete_requested: bool,
    /// Set while a launched activity owes the task a progress report
    pub awaiting_activity: bool,
    pub resources_released: bool,
    pub transitions: Vec<TaskTransition>,
}

impl Task {
    pub fn new(task_type: TaskType, attributes: Value, now: DateTime<Utc>) -> Self {
        let timeout_at = timeout_seconds(&attributes).and_then(|secs| deadline_from(now, secs));
        Self {
            id: Identifier::generate(),
            task_type,
            attributes,
            status: TaskStatus::Pending,
            created_at: now,
            timeout_at,
            last_evaluated_at: None,
            delete_requested: false,
            awaiting_activity: false,
            resources_released: false,
            transitions: Vec::new(),
        }
    }

    /// Live tasks occupy a queue slot and are visible to lookups
    pub fn is_live(&self) -> bool {
        !self.delete_requested
    }

    pub fn is_removable(&self) -> bool {
        status_groups::TASK_FINAL_STATES.contains(&self.status)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.timeout_at.is_some_and(|deadline| now > deadline)
    }

    /// Apply a status change when the lifecycle allows it, recording it in the log
    pub fn transition_to(&mut self, next: TaskStatus, at: DateTime<Utc>) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.transitions
            .push(TaskTransition::new(self.status, next, at));
        self.status = next;
        true
    }

    /// Unredacted snapshot; handlers strip secrets before it reaches a caller
    pub fn snapshot(&self) -> TaskSnapshot {
        let mut attributes = match &self.attributes {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        attributes.insert(
            attributes::STATUS.to_string(),
            Value::String(self.status.to_string()),
        );

        TaskSnapshot {
            id: self.id,
            task_type: self.task_type.name().to_string(),
            attributes: Value::Object(attributes),
            created: self.created_at.timestamp(),
            timeout: self.timeout_at.map(|deadline| deadline.timestamp()),
        }
    }
}

/// Absolute deadline `secs` after `now`; unrepresentable values mean no deadline
fn deadline_from(now: DateTime<Utc>, secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let millis = (secs * 1_000.0).round() as i64;
    TimeDelta::try_milliseconds(millis).and_then(|delta| now.checked_add_signed(delta))
}

/// Caller-facing serialized view of a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: Identifier,
    #[serde(rename = "type")]
    pub task_type: String,
    pub attributes: Value,
    /// Creation time, epoch seconds
    pub created: i64,
    /// Deadline, epoch seconds
    pub timeout: Option<i64>,
}

impl TaskSnapshot {
    pub fn status(&self) -> Option<TaskStatus> {
        self.attributes
            .get(attributes::STATUS)
            .and_then(Value::as_str)
            .and_then(|status| status.parse().ok())
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Paging window over the task collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionMeta {
    pub offset: usize,
    pub limit: usize,
    pub total: usize,
}

/// Paging metadata wrapper, serialized as `{"collection": {...}}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingMeta {
    pub collection: CollectionMeta,
}

impl PagingMeta {
    pub fn new(offset: usize, limit: usize, total: usize) -> Self {
        Self {
            collection: CollectionMeta {
                offset,
                limit,
                total,
            },
        }
    }
}
