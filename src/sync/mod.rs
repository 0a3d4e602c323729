//! # Synchronization Primitives
//!
//! Shared-state guards used by the task queue, the allow-list and the
//! commissioning subsystem gate.

pub mod exclusive;

pub use exclusive::{ExclusiveRegion, LockError, LockMode, RegionGuard};
