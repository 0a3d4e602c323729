//! # Data Models
//!
//! Value types shared by the task queue, the allow-list and the
//! commissioning subsystem interface.
//!
//! - [`DeviceId`]: hardware identity of a joining device
//! - [`JoinCredential`]: format-checked join secret, redacted in debug output
//! - [`Task`], [`TaskRequest`], [`TaskSnapshot`]: queued work and its views
//! - [`TaskTransition`]: applied status change

pub mod credential;
pub mod device;
pub mod task;
pub mod transitions;

// Re-export core models for easy access
pub use credential::{CredentialViolation, JoinCredential};
pub use device::DeviceId;
pub use task::{CollectionMeta, PagingMeta, Task, TaskRequest, TaskSnapshot};
pub use transitions::TaskTransition;
