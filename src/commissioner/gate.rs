//! Serialized access to the commissioning subsystem, and the bridge that
//! feeds its joiner events into the allow-list.

use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

use super::interface::{
    Commissioner, CommissionerError, CommissionerState, JoinerEvent, JoinerEventSink,
};
use crate::allow_list::AllowList;
use crate::models::{DeviceId, JoinCredential};
use crate::sync::{ExclusiveRegion, LockError, LockMode};

/// Owns the subsystem and serializes every call into it
pub struct CommissionerGate {
    inner: ExclusiveRegion<Box<dyn Commissioner>>,
}

impl CommissionerGate {
    pub fn new(commissioner: Box<dyn Commissioner>) -> Self {
        Self {
            inner: ExclusiveRegion::new("commissioner", commissioner),
        }
    }

    pub fn start(&self, sink: Arc<dyn JoinerEventSink>) -> Result<(), CommissionerError> {
        self.inner.lock().start(sink)
    }

    pub fn stop(&self) -> Result<(), CommissionerError> {
        self.inner.lock().stop()
    }

    /// Stop unless another caller holds the gate
    pub fn try_stop(&self) -> Result<Result<(), CommissionerError>, LockError> {
        let mut commissioner = self.inner.acquire(LockMode::NonBlocking)?;
        Ok(commissioner.stop())
    }

    pub fn state(&self) -> CommissionerState {
        self.inner.lock().state()
    }

    pub fn add_joiner(
        &self,
        device_id: Option<DeviceId>,
        credential: &JoinCredential,
        timeout_secs: u32,
    ) -> Result<(), CommissionerError> {
        self.inner
            .lock()
            .add_joiner(device_id, credential, timeout_secs)
    }

    /// Remove a joiner; a disabled commissioner has nothing to remove
    pub fn remove_joiner(&self, device_id: Option<DeviceId>) -> Result<(), CommissionerError> {
        let mut commissioner = self.inner.lock();
        if commissioner.state() == CommissionerState::Disabled {
            return Ok(());
        }
        commissioner.remove_joiner(device_id)
    }
}

impl std::fmt::Debug for CommissionerGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommissionerGate")
            .field("region", &self.inner)
            .finish()
    }
}

/// Joiner event sink that promotes allow-list entries and stops the
/// commissioner once no joiner is pending
pub struct JoinerEventBridge {
    allow_list: Arc<AllowList>,
    gate: Weak<CommissionerGate>,
}

impl JoinerEventBridge {
    pub fn new(allow_list: Arc<AllowList>, gate: &Arc<CommissionerGate>) -> Self {
        Self {
            allow_list,
            gate: Arc::downgrade(gate),
        }
    }
}

impl JoinerEventSink for JoinerEventBridge {
    fn on_joiner_event(&self, event: JoinerEvent, device_id: Option<DeviceId>) {
        let outcome = self.allow_list.handle_joiner_event(event, device_id);
        if !outcome.stop_recommended {
            return;
        }

        let Some(gate) = self.gate.upgrade() else {
            debug!("Commissioner gate dropped, nothing to stop");
            return;
        };
        match gate.try_stop() {
            Ok(Ok(())) => info!("🛑 COMMISSIONER: No joiners pending, stopped"),
            Ok(Err(e)) => warn!(error = %e, "Commissioner stop failed"),
            Err(e) => debug!(error = %e, "Commissioner busy, stop skipped"),
        }
    }
}
