//! # Network Commissioning Subsystem
//!
//! The engine talks to the subsystem that actually admits devices through
//! the narrow [`Commissioner`] interface. Every call is serialized by a
//! [`CommissionerGate`]; joiner events flow back through a
//! [`JoinerEventBridge`] into the [`crate::allow_list::AllowList`].
//!
//! [`CommissioningService`] composes subsystem calls with allow-list
//! bookkeeping. [`SimulatedCommissioner`] is an in-memory subsystem for
//! tests and local runs.

pub mod gate;
pub mod interface;
pub mod service;
pub mod simulated;

pub use gate::{CommissionerGate, JoinerEventBridge};
pub use interface::{
    Commissioner, CommissionerError, CommissionerState, JoinerEvent, JoinerEventSink,
};
pub use service::CommissioningService;
pub use simulated::{Activation, CommissionerCall, SimulatedCommissioner};
