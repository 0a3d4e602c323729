//! # System Constants
//!
//! Reference values that define the operational boundaries of the task queue
//! and the device admission flow. Runtime-tunable values have a matching
//! field in [`crate::config::EngineConfig`] whose default is taken from here.

// Re-export state types for convenience
pub use crate::state_machine::{EntryState, TaskStatus};

/// Task queue sizing and pacing
pub mod queue {
    /// Maximum number of live tasks held by the queue
    pub const TASK_QUEUE_MAX: usize = 10;

    /// Delay before the driver wraps back to the head of the queue
    pub const DRIVER_TICK_MS: u64 = 1;

    /// Pause granted to the driver after an eviction was requested
    pub const EVICTION_GRACE_MS: u64 = 10;
}

/// Device admission timing and credential policy
pub mod admission {
    /// Wire name of the device admission task type
    pub const ADD_THREAD_DEVICE_TASK: &str = "addThreadDeviceTask";

    /// Interval between commissioner readiness checks
    pub const READINESS_POLL_INTERVAL_MS: u64 = 1_000;

    /// Overall bound on waiting for the commissioner to become active
    pub const READINESS_DEADLINE_MS: u64 = 10_000;

    /// Join credential length bounds (inclusive)
    pub const CREDENTIAL_MIN_LENGTH: usize = 6;
    pub const CREDENTIAL_MAX_LENGTH: usize = 32;

    /// Uppercase characters excluded from join credentials
    pub const CREDENTIAL_EXCLUDED_CHARS: &[char] = &['I', 'O', 'Q', 'Z'];

    /// Number of bytes in a device hardware identity
    pub const DEVICE_ID_LENGTH: usize = 8;
}

/// JSON attribute names used by task payloads and snapshots
pub mod attributes {
    pub const TYPE: &str = "type";
    pub const ATTRIBUTES: &str = "attributes";
    pub const STATUS: &str = "status";
    pub const TIMEOUT: &str = "timeout";
    pub const ACTIVATION_KEY: &str = "hasActivationKey";
    pub const DEVICE_ID: &str = "eui";
    pub const JOIN_CREDENTIAL: &str = "joinCred";
    pub const UUID: &str = "uuid";
    pub const STATE: &str = "state";
}

/// Status groupings used by the driver and eviction policy
pub mod status_groups {
    use super::TaskStatus;

    /// Statuses that make a task eligible for removal
    pub const TASK_FINAL_STATES: &[TaskStatus] =
        &[TaskStatus::Completed, TaskStatus::Stopped, TaskStatus::Failed];

    /// Statuses the driver keeps advancing
    pub const TASK_ACTIVE_STATES: &[TaskStatus] = &[TaskStatus::Pending, TaskStatus::Active];
}
