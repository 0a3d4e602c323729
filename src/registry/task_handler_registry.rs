//! # Task Handler Registry
//!
//! Init-time mapping from [`TaskType`] to its [`TaskHandler`]. Built once
//! when the engine starts and then only read, so lookups need no locking.
//!
//! ```rust
//! use tasker_admission::registry::{TaskHandlerRegistry, TaskType};
//!
//! let registry = TaskHandlerRegistry::new();
//! assert!(registry.get(TaskType::AddThreadDevice).is_none());
//! assert!(registry.verify_complete().is_err());
//! ```

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::handler::TaskHandler;
use super::task_type::TaskType;
use crate::constants::attributes;
use crate::error::{Result, TaskerError};
use crate::models::TaskRequest;

#[derive(Default)]
pub struct TaskHandlerRegistry {
    handlers: HashMap<TaskType, Arc<dyn TaskHandler>>,
}

impl TaskHandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler under its own task type, returning any handler it replaced
    pub fn register(&mut self, handler: Arc<dyn TaskHandler>) -> Option<Arc<dyn TaskHandler>> {
        let task_type = handler.task_type();
        info!(task_type = %task_type, "Registered task handler");
        let previous = self.handlers.insert(task_type, handler);
        if previous.is_some() {
            warn!(task_type = %task_type, "Replaced existing task handler");
        }
        previous
    }

    pub fn get(&self, task_type: TaskType) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(&task_type).cloned()
    }

    pub fn resolve(&self, name: &str) -> Result<(TaskType, Arc<dyn TaskHandler>)> {
        let task_type = TaskType::from_name(name)
            .ok_or_else(|| TaskerError::ValidationError(format!("Unknown task type '{name}'")))?;
        let handler = self.get(task_type).ok_or_else(|| {
            TaskerError::ValidationError(format!("No handler registered for '{name}'"))
        })?;
        Ok((task_type, handler))
    }

    /// Every task type must have a handler before the engine runs
    pub fn verify_complete(&self) -> Result<()> {
        let missing: Vec<&str> = TaskType::ALL
            .iter()
            .filter(|t| !self.handlers.contains_key(t))
            .map(|t| t.name())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(TaskerError::ConfigurationError(format!(
                "Task types without a handler: {}",
                missing.join(", ")
            )))
        }
    }

    /// Parse and validate a raw request object
    pub fn validate_request(&self, request: &Value) -> Result<TaskRequest> {
        let task_type = request
            .get(attributes::TYPE)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                TaskerError::ValidationError("Request is missing a string 'type'".to_string())
            })?;
        let task_attributes = request
            .get(attributes::ATTRIBUTES)
            .filter(|a| a.is_object())
            .ok_or_else(|| {
                TaskerError::ValidationError("Request is missing an 'attributes' object".to_string())
            })?;

        let parsed = TaskRequest::new(task_type, task_attributes.clone());
        self.validate(&parsed)?;
        Ok(parsed)
    }

    /// Validate a parsed request, returning the resolved task type
    pub fn validate(&self, request: &TaskRequest) -> Result<TaskType> {
        if !request.attributes.is_object() {
            return Err(TaskerError::ValidationError(
                "Task attributes must be an object".to_string(),
            ));
        }
        if let Some(timeout) = request.attributes.get(attributes::TIMEOUT) {
            if !timeout.is_number() {
                return Err(TaskerError::ValidationError(
                    "Task timeout must be numeric".to_string(),
                ));
            }
        }

        let (task_type, handler) = self.resolve(&request.task_type)?;
        handler.validate(&request.attributes)?;
        debug!(task_type = %task_type, "Task request validated");
        Ok(task_type)
    }

    pub fn registered_types(&self) -> Vec<TaskType> {
        let mut types: Vec<TaskType> = self.handlers.keys().copied().collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for TaskHandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandlerRegistry")
            .field("registered", &self.registered_types())
            .finish()
    }
}
