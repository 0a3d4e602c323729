use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Initial state, waiting for begin-processing (or retrying it)
    Pending,
    /// Processing has begun and progress is being evaluated
    Active,
    /// Task completed successfully
    Completed,
    /// Deadline elapsed before the task finished
    Stopped,
    /// Task was actively rejected or a subsystem call failed
    Failed,
}

impl TaskStatus {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Stopped | Self::Failed)
    }

    /// Check if this is an active state (task is being processed)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Whether the lifecycle permits moving from `self` to `next`
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        match (self, next) {
            (Self::Pending, Self::Pending | Self::Active | Self::Stopped) => true,
            (Self::Active, Self::Pending | Self::Completed | Self::Failed | Self::Stopped) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "stopped" => Ok(Self::Stopped),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid task status: {s}")),
        }
    }
}

/// Default state for new tasks
impl Default for TaskStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// Promotion state of an admission allow-list entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    /// Entry created, not yet handed to the commissioner
    New,
    /// Commissioner accepted the device as a joiner candidate
    ActiveJoiner,
    /// Device finished joining
    Joined,
    /// Joiner was removed before it joined
    JoinFailed,
}

impl EntryState {
    /// Joined and JoinFailed end task evaluation; the entry stays until erased
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Joined | Self::JoinFailed)
    }

    /// Still waiting on the commissioner
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::New | Self::ActiveJoiner)
    }

    /// Projection consulted by task evaluation
    pub fn join_status(&self) -> JoinStatus {
        match self {
            Self::Joined => JoinStatus::Succeeded,
            Self::JoinFailed => JoinStatus::Failed,
            Self::New | Self::ActiveJoiner => JoinStatus::Pending,
        }
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::ActiveJoiner => write!(f, "active_joiner"),
            Self::Joined => write!(f, "joined"),
            Self::JoinFailed => write!(f, "join_failed"),
        }
    }
}

impl Default for EntryState {
    fn default() -> Self {
        Self::New
    }
}

/// Join outcome for a device identity, as seen through the allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinStatus {
    Succeeded,
    Failed,
    Pending,
    NotFound,
}
