//! Commissioning operations composed with the allow-list.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::gate::{CommissionerGate, JoinerEventBridge};
use super::interface::{Commissioner, CommissionerError, CommissionerState, JoinerEventSink};
use crate::allow_list::AllowList;
use crate::models::{DeviceId, JoinCredential};
use crate::state_machine::EntryState;

pub struct CommissioningService {
    gate: Arc<CommissionerGate>,
    allow_list: Arc<AllowList>,
    bridge: Arc<JoinerEventBridge>,
    allow_any_joiner: bool,
}

impl CommissioningService {
    pub fn new(
        commissioner: Box<dyn Commissioner>,
        allow_list: Arc<AllowList>,
        allow_any_joiner: bool,
    ) -> Self {
        let gate = Arc::new(CommissionerGate::new(commissioner));
        let bridge = Arc::new(JoinerEventBridge::new(allow_list.clone(), &gate));
        Self {
            gate,
            allow_list,
            bridge,
            allow_any_joiner,
        }
    }

    pub fn allow_list(&self) -> &Arc<AllowList> {
        &self.allow_list
    }

    pub fn gate(&self) -> &Arc<CommissionerGate> {
        &self.gate
    }

    pub fn allows_any_joiner(&self) -> bool {
        self.allow_any_joiner
    }

    pub fn state(&self) -> CommissionerState {
        self.gate.state()
    }

    /// Start the commissioner; an already running one counts as started
    #[instrument(skip(self))]
    pub fn start_commissioner(&self) -> Result<(), CommissionerError> {
        let sink: Arc<dyn JoinerEventSink> = self.bridge.clone();
        match self.gate.start(sink) {
            Ok(()) => {
                info!("🚀 COMMISSIONER: Start requested");
                Ok(())
            }
            Err(CommissionerError::Already) => Ok(()),
            Err(e) => {
                warn!(error = %e, "❌ COMMISSIONER: Failed to start");
                Err(e)
            }
        }
    }

    pub fn stop_commissioner(&self) -> Result<(), CommissionerError> {
        self.gate.stop()
    }

    /// Register a joiner with the commissioner.
    ///
    /// A listed device gets an allow-list entry that is promoted to
    /// `ActiveJoiner` once the commissioner accepts it. The null identity
    /// is only passed through, without an entry, when any joiner is allowed.
    #[instrument(skip(self, credential))]
    pub fn add_joiner(
        &self,
        device_id: DeviceId,
        timeout_secs: u32,
        credential: &JoinCredential,
    ) -> Result<(), CommissionerError> {
        if device_id.is_null() {
            if !self.allow_any_joiner {
                return Err(CommissionerError::InvalidArgs(
                    "null device identity requires allow_any_joiner".to_string(),
                ));
            }
            return self.gate.add_joiner(None, credential, timeout_secs);
        }

        self.allow_list
            .add_or_update(device_id, timeout_secs, credential.clone());

        match self
            .gate
            .add_joiner(Some(device_id), credential, timeout_secs)
        {
            Ok(()) => {
                self.allow_list
                    .promote(&device_id, EntryState::ActiveJoiner);
                info!(device_id = %device_id, "📡 COMMISSIONER: Joiner added");
                Ok(())
            }
            Err(e) => {
                warn!(device_id = %device_id, error = %e, "Commissioner rejected joiner");
                Err(e)
            }
        }
    }

    /// Remove a joiner; a joiner the commissioner no longer knows is already gone
    pub fn remove_joiner(&self, device_id: DeviceId) -> Result<(), CommissionerError> {
        let target = (!device_id.is_null()).then_some(device_id);
        match self.gate.remove_joiner(target) {
            Ok(()) | Err(CommissionerError::NotFound) => Ok(()),
            Err(e) => {
                warn!(device_id = %device_id, error = %e, "Commissioner failed to remove joiner");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for CommissioningService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommissioningService")
            .field("allow_any_joiner", &self.allow_any_joiner)
            .field("allow_list_len", &self.allow_list.len())
            .finish()
    }
}
