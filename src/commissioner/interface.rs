//! Narrow interface to the network commissioning subsystem.
//!
//! The subsystem implements the actual joiner protocol. This crate only
//! sequences calls into it and reacts to the joiner events it reports.
//! Implementations are not expected to be reentrant; all calls go through
//! [`super::CommissionerGate`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{DeviceId, JoinCredential};

/// Commissioner role state reported by the subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionerState {
    Disabled,
    Petitioning,
    Active,
}

impl CommissionerState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for CommissionerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::Petitioning => write!(f, "petitioning"),
            Self::Active => write!(f, "active"),
        }
    }
}

/// Per-joiner progress notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinerEvent {
    Started,
    Connected,
    Finalized,
    Ended,
    Removed,
}

impl fmt::Display for JoinerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => write!(f, "started"),
            Self::Connected => write!(f, "connected"),
            Self::Finalized => write!(f, "finalized"),
            Self::Ended => write!(f, "ended"),
            Self::Removed => write!(f, "removed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommissionerError {
    #[error("commissioner already started")]
    Already,
    #[error("commissioner is in an invalid state: {0}")]
    InvalidState(CommissionerState),
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("joiner not found")]
    NotFound,
    #[error("commissioner has no buffers available")]
    NoBufs,
    #[error("commissioner call failed: {0}")]
    Failed(String),
}

/// Receiver of joiner events; the subsystem may call it from any thread
pub trait JoinerEventSink: Send + Sync {
    fn on_joiner_event(&self, event: JoinerEvent, device_id: Option<DeviceId>);
}

/// Calls the engine makes into the commissioning subsystem.
///
/// `device_id` of `None` addresses any joiner. Implementations may block;
/// the admission handler makes every call from `spawn_blocking`, never on an
/// async worker.
pub trait Commissioner: Send {
    fn start(&mut self, sink: Arc<dyn JoinerEventSink>) -> Result<(), CommissionerError>;

    fn stop(&mut self) -> Result<(), CommissionerError>;

    fn state(&self) -> CommissionerState;

    fn add_joiner(
        &mut self,
        device_id: Option<DeviceId>,
        credential: &JoinCredential,
        timeout_secs: u32,
    ) -> Result<(), CommissionerError>;

    fn remove_joiner(&mut self, device_id: Option<DeviceId>) -> Result<(), CommissionerError>;
}
