//! # Structured Logging Module
//!
//! Environment-aware structured logging for the engine, with operation
//! loggers that give task and allow-list changes a consistent field layout.

use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::{detect_environment, LogFormat, LoggingConfig};
use crate::identifier::Identifier;
use crate::models::DeviceId;
use crate::registry::TaskType;
use crate::state_machine::{EntryState, TaskStatus};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging; later calls are no-ops
pub fn init_structured_logging(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = detect_environment();
        let level = config
            .level
            .clone()
            .unwrap_or_else(|| get_log_level(&environment).to_string());

        // RUST_LOG wins over configuration
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

        let layer = match config.format {
            LogFormat::Json => fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false)
                .json()
                .with_filter(filter)
                .boxed(),
            LogFormat::Pretty => fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed(),
        };

        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            // someone else installed a global subscriber first
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            environment = %environment,
            level = %level,
            format = ?config.format,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

/// Default log level for an environment
pub fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "test" => "debug",
        "development" => "debug",
        "production" => "info",
        _ => "debug",
    }
}

/// Log structured data for task operations
pub fn log_task_operation(
    operation: &str,
    task_id: &Identifier,
    task_type: TaskType,
    status: TaskStatus,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        task_id = %task_id,
        task_type = %task_type,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "📋 TASK_OPERATION"
    );
}

/// Log structured data for allow-list operations
pub fn log_allow_list_operation(
    operation: &str,
    device_id: &DeviceId,
    state: EntryState,
    previous: Option<EntryState>,
) {
    tracing::info!(
        operation = %operation,
        device_id = %device_id,
        state = %state,
        previous = ?previous,
        timestamp = %Utc::now().to_rfc3339(),
        "🔐 ALLOW_LIST_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "❌ ERROR"
    );
}
