//! # Task Handlers
//!
//! Concrete [`TaskHandler`](crate::registry::TaskHandler) registrations.

pub mod add_thread_device;
pub mod slot;

pub use add_thread_device::AddThreadDeviceHandler;
pub use slot::{AdmissionPermit, AdmissionSlot};
