//! # Engine Configuration
//!
//! Typed configuration for the task queue, the device admission flow and
//! structured logging. Every field has a compiled default, so an empty
//! configuration source yields a working engine.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tasker_admission::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load configuration (environment auto-detected from TASKER_ENV)
//! let manager = ConfigManager::load()?;
//!
//! let max_tasks = manager.config().task_queue.max_tasks;
//! let deadline = manager.config().admission.readiness_deadline_ms;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{admission, queue};

pub use error::{ConfigResult, ConfigurationError};
pub use loader::{detect_environment, ConfigManager};

/// Root configuration for a [`crate::orchestration::TaskEngine`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub task_queue: TaskQueueConfig,
    pub admission: AdmissionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskQueueConfig {
    /// Maximum number of live tasks
    pub max_tasks: usize,
    /// Driver pause between passes over the queue
    pub tick_interval_ms: u64,
    /// Pause after requesting an eviction so the driver can clean up
    pub eviction_grace_ms: u64,
}

impl Default for TaskQueueConfig {
    fn default() -> Self {
        Self {
            max_tasks: queue::TASK_QUEUE_MAX,
            tick_interval_ms: queue::DRIVER_TICK_MS,
            eviction_grace_ms: queue::EVICTION_GRACE_MS,
        }
    }
}

impl TaskQueueConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Accept admission requests without a device identity
    pub allow_any_joiner: bool,
    pub readiness_poll_interval_ms: u64,
    pub readiness_deadline_ms: u64,
    /// Gate task completion on the allow-list join status
    pub evaluate_join_status: bool,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            allow_any_joiner: false,
            readiness_poll_interval_ms: admission::READINESS_POLL_INTERVAL_MS,
            readiness_deadline_ms: admission::READINESS_DEADLINE_MS,
            evaluate_join_status: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Explicit filter level; falls back to the environment default
    pub level: Option<String>,
    pub format: LogFormat,
}

impl EngineConfig {
    /// Validate configuration for consistency
    pub fn validate(&self) -> ConfigResult<()> {
        if self.task_queue.max_tasks == 0 {
            return Err(ConfigurationError::invalid_value(
                "task_queue.max_tasks",
                0,
                "queue capacity must be greater than 0",
            ));
        }

        if self.task_queue.tick_interval_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "task_queue.tick_interval_ms",
                0,
                "driver tick must be greater than 0",
            ));
        }

        if self.admission.readiness_poll_interval_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "admission.readiness_poll_interval_ms",
                0,
                "poll interval must be greater than 0",
            ));
        }

        if self.admission.readiness_deadline_ms < self.admission.readiness_poll_interval_ms {
            return Err(ConfigurationError::invalid_value(
                "admission.readiness_deadline_ms",
                self.admission.readiness_deadline_ms,
                "deadline must not be shorter than the poll interval",
            ));
        }

        if let Some(level) = &self.logging.level {
            if level.trim().is_empty() {
                return Err(ConfigurationError::invalid_value(
                    "logging.level",
                    level,
                    "level must not be blank",
                ));
            }
        }

        Ok(())
    }
}
