//! Process-wide single-flight slot for device admission.
//!
//! Only one admission may be between "start the commissioner" and "joiner
//! added (or given up)" at any time. The slot is held by an
//! [`AdmissionPermit`] and released when the permit drops, whichever path
//! finishes the admission.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Default)]
pub struct AdmissionSlot {
    busy: Mutex<bool>,
}

impl AdmissionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot, or `None` when an admission is already in flight
    pub fn try_acquire(self: &Arc<Self>) -> Option<AdmissionPermit> {
        let mut busy = self.busy.lock();
        if *busy {
            return None;
        }
        *busy = true;
        trace!("Admission slot claimed");
        Some(AdmissionPermit {
            slot: Arc::clone(self),
        })
    }

    pub fn is_busy(&self) -> bool {
        *self.busy.lock()
    }
}

/// Ownership of the admission slot
#[derive(Debug)]
pub struct AdmissionPermit {
    slot: Arc<AdmissionSlot>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        *self.slot.busy.lock() = false;
        trace!("Admission slot released");
    }
}
