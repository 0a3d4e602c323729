//! # Task Handler Registry
//!
//! Task types form a closed set ([`TaskType`]); each is served by one
//! [`TaskHandler`] implementing describe, validate, process, evaluate and
//! clean. The [`TaskHandlerRegistry`] maps types to handlers and runs
//! request validation before anything reaches the queue.
//!
//! ```text
//! request ──validate_request──▶ TaskType ──get──▶ Arc<dyn TaskHandler>
//! ```

pub mod handler;
pub mod task_handler_registry;
pub mod task_type;

// Re-export main types for easy access
pub use handler::{TaskContext, TaskHandler};
pub use task_handler_registry::TaskHandlerRegistry;
pub use task_type::TaskType;
