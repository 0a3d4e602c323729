use serde::{Deserialize, Serialize};
use std::fmt;

/// Result reported by a task handler operation to the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerOutcome {
    /// Operation finished; begin-processing leaves the task active, evaluate completes it
    Success,
    /// A concurrent activity was launched and will report back through a progress handle
    Pending,
    /// Could not start now; the driver puts the task back to pending and tries again
    Retry,
    /// Operation rejected the task
    Failure,
    /// Nothing to report this pass
    NoChange,
}

impl HandlerOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure)
    }

    pub fn should_retry(&self) -> bool {
        matches!(self, Self::Retry)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Pending => "pending",
            Self::Retry => "retry",
            Self::Failure => "failure",
            Self::NoChange => "no_change",
        }
    }
}

impl fmt::Display for HandlerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
