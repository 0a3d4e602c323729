//! In-memory commissioning subsystem.
//!
//! Scripted state progression, failure injection and call recording for
//! exercising the engine without a radio. Clones share one simulated
//! subsystem, so a test can keep a handle while the engine owns another.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

use super::interface::{
    Commissioner, CommissionerError, CommissionerState, JoinerEvent, JoinerEventSink,
};
use crate::models::{DeviceId, JoinCredential};

/// How the simulated commissioner reaches `Active` after `start`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Active as soon as it starts
    Immediate,
    /// Petitioning until its state was queried this many times
    AfterPolls(u32),
    /// Petitioning until a test calls [`SimulatedCommissioner::set_state`]
    Manual,
}

/// A call received by the simulated commissioner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommissionerCall {
    Start,
    Stop,
    AddJoiner {
        device_id: Option<DeviceId>,
        timeout_secs: u32,
    },
    RemoveJoiner {
        device_id: Option<DeviceId>,
    },
}

struct SimulatedState {
    state: CommissionerState,
    activation: Activation,
    polls: u32,
    sink: Option<Arc<dyn JoinerEventSink>>,
    joiners: Vec<Option<DeviceId>>,
    calls: Vec<CommissionerCall>,
    start_error: Option<CommissionerError>,
    add_error: Option<CommissionerError>,
    remove_error: Option<CommissionerError>,
}

#[derive(Clone)]
pub struct SimulatedCommissioner {
    shared: Arc<Mutex<SimulatedState>>,
}

impl SimulatedCommissioner {
    pub fn new(activation: Activation) -> Self {
        Self {
            shared: Arc::new(Mutex::new(SimulatedState {
                state: CommissionerState::Disabled,
                activation,
                polls: 0,
                sink: None,
                joiners: Vec::new(),
                calls: Vec::new(),
                start_error: None,
                add_error: None,
                remove_error: None,
            })),
        }
    }

    pub fn set_state(&self, state: CommissionerState) {
        self.shared.lock().state = state;
    }

    pub fn fail_start_with(&self, error: CommissionerError) {
        self.shared.lock().start_error = Some(error);
    }

    pub fn fail_add_with(&self, error: CommissionerError) {
        self.shared.lock().add_error = Some(error);
    }

    pub fn fail_remove_with(&self, error: CommissionerError) {
        self.shared.lock().remove_error = Some(error);
    }

    pub fn calls(&self) -> Vec<CommissionerCall> {
        self.shared.lock().calls.clone()
    }

    pub fn count_calls(&self, predicate: impl Fn(&CommissionerCall) -> bool) -> usize {
        self.shared.lock().calls.iter().filter(|c| predicate(c)).count()
    }

    pub fn joiners(&self) -> Vec<Option<DeviceId>> {
        self.shared.lock().joiners.clone()
    }

    /// Deliver a joiner event to the registered sink, as the subsystem would
    pub fn emit(&self, event: JoinerEvent, device_id: Option<DeviceId>) -> bool {
        // the sink may call back into the commissioner
        let sink = self.shared.lock().sink.clone();
        match sink {
            Some(sink) => {
                debug!(event = %event, device_id = ?device_id, "Simulated joiner event");
                sink.on_joiner_event(event, device_id);
                true
            }
            None => false,
        }
    }
}

impl Commissioner for SimulatedCommissioner {
    fn start(&mut self, sink: Arc<dyn JoinerEventSink>) -> Result<(), CommissionerError> {
        let mut shared = self.shared.lock();
        shared.calls.push(CommissionerCall::Start);
        if shared.state != CommissionerState::Disabled {
            return Err(CommissionerError::Already);
        }
        if let Some(error) = shared.start_error.clone() {
            return Err(error);
        }
        shared.sink = Some(sink);
        shared.polls = 0;
        shared.state = match shared.activation {
            Activation::Immediate => CommissionerState::Active,
            Activation::AfterPolls(_) | Activation::Manual => CommissionerState::Petitioning,
        };
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CommissionerError> {
        let mut shared = self.shared.lock();
        shared.calls.push(CommissionerCall::Stop);
        if shared.state == CommissionerState::Disabled {
            return Err(CommissionerError::Already);
        }
        shared.state = CommissionerState::Disabled;
        shared.joiners.clear();
        Ok(())
    }

    fn state(&self) -> CommissionerState {
        let mut shared = self.shared.lock();
        if shared.state == CommissionerState::Petitioning {
            shared.polls += 1;
            if let Activation::AfterPolls(needed) = shared.activation {
                if shared.polls >= needed {
                    shared.state = CommissionerState::Active;
                }
            }
        }
        shared.state
    }

    fn add_joiner(
        &mut self,
        device_id: Option<DeviceId>,
        _credential: &JoinCredential,
        timeout_secs: u32,
    ) -> Result<(), CommissionerError> {
        let mut shared = self.shared.lock();
        shared.calls.push(CommissionerCall::AddJoiner {
            device_id,
            timeout_secs,
        });
        if shared.state != CommissionerState::Active {
            return Err(CommissionerError::InvalidState(shared.state));
        }
        if let Some(error) = shared.add_error.clone() {
            return Err(error);
        }
        if !shared.joiners.contains(&device_id) {
            shared.joiners.push(device_id);
        }
        Ok(())
    }

    fn remove_joiner(&mut self, device_id: Option<DeviceId>) -> Result<(), CommissionerError> {
        let mut shared = self.shared.lock();
        shared.calls.push(CommissionerCall::RemoveJoiner { device_id });
        if let Some(error) = shared.remove_error.clone() {
            return Err(error);
        }
        match shared.joiners.iter().position(|j| *j == device_id) {
            Some(index) => {
                shared.joiners.remove(index);
                Ok(())
            }
            None => Err(CommissionerError::NotFound),
        }
    }
}

impl std::fmt::Debug for SimulatedCommissioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.shared.lock();
        f.debug_struct("SimulatedCommissioner")
            .field("state", &shared.state)
            .field("activation", &shared.activation)
            .field("joiners", &shared.joiners.len())
            .finish()
    }
}
