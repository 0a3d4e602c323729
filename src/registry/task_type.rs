use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::admission::ADD_THREAD_DEVICE_TASK;

/// Closed set of task types the engine knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaskType {
    #[serde(rename = "addThreadDeviceTask")]
    AddThreadDevice,
}

impl TaskType {
    pub const ALL: &'static [TaskType] = &[TaskType::AddThreadDevice];

    /// Wire name used in requests and snapshots
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddThreadDevice => ADD_THREAD_DEVICE_TASK,
        }
    }

    /// Exact, case-sensitive lookup by wire name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
