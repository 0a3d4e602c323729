//! # Admission Allow-List
//!
//! Ordered collection of devices currently permitted to join, keyed by
//! device identity. Entries are created by the device-admission handler and
//! promoted asynchronously by joiner events from the commissioning
//! subsystem; both paths serialize through the list's exclusive region.
//!
//! Lookups are linear scans. Cardinality is bounded by the task queue's own
//! capacity.

pub mod entry;
pub mod list;

pub use entry::AllowListEntry;
pub use list::{AllowList, JoinerEventOutcome};
