//! Allow-list storage and operations.
//!
//! Every operation takes the list's exclusive region in blocking mode for its
//! whole duration, so lookup-then-insert sequences are atomic and joiner
//! events from the commissioning subsystem serialize with task handlers.
//! Results are returned as clones; no caller ever holds a reference into
//! the list.

use serde_json::Value;
use tracing::{debug, info, warn};

use super::entry::AllowListEntry;
use crate::commissioner::JoinerEvent;
use crate::logging::log_allow_list_operation;
use crate::models::{DeviceId, JoinCredential};
use crate::state_machine::{EntryState, JoinStatus};
use crate::sync::ExclusiveRegion;

/// What the caller should do after a joiner event was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinerEventOutcome {
    /// Entries still `New` or `ActiveJoiner` after the event
    pub pending_joiners: usize,
    /// No joiner is pending anymore, so the commissioner can be stopped
    pub stop_recommended: bool,
}

#[derive(Debug)]
pub struct AllowList {
    entries: ExclusiveRegion<Vec<AllowListEntry>>,
}

impl AllowList {
    pub fn new() -> Self {
        Self {
            entries: ExclusiveRegion::new("allow_list", Vec::new()),
        }
    }

    pub fn find(&self, device_id: &DeviceId) -> Option<AllowListEntry> {
        let entries = self.entries.lock();
        entries.iter().find(|e| &e.device_id == device_id).cloned()
    }

    /// Create an entry in `New`, or replace the credential of an existing one
    pub fn add_or_update(
        &self,
        device_id: DeviceId,
        timeout_secs: u32,
        credential: JoinCredential,
    ) -> AllowListEntry {
        let mut entries = self.entries.lock();

        if let Some(existing) = entries.iter_mut().find(|e| e.device_id == device_id) {
            existing.credential = credential;
            debug!(device_id = %device_id, entry_id = %existing.entry_id, "Updated allow-list credential");
            log_allow_list_operation("update", &device_id, existing.state, None);
            return existing.clone();
        }

        let entry = AllowListEntry::new(device_id, timeout_secs, credential);
        info!(
            device_id = %device_id,
            entry_id = %entry.entry_id,
            timeout_secs = timeout_secs,
            "📋 ALLOW_LIST: Added device"
        );
        log_allow_list_operation("add", &device_id, entry.state, None);
        entries.push(entry.clone());
        entry
    }

    /// Remove one entry; `None` means the device was not listed
    pub fn erase(&self, device_id: &DeviceId) -> Option<AllowListEntry> {
        let mut entries = self.entries.lock();
        let position = entries.iter().position(|e| &e.device_id == device_id)?;
        let removed = entries.remove(position);
        log_allow_list_operation("erase", device_id, removed.state, None);
        Some(removed)
    }

    /// Drop every entry, returning how many were removed
    pub fn erase_all(&self) -> usize {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();
        info!(removed = count, "📋 ALLOW_LIST: Cleared all entries");
        count
    }

    /// Set an entry's state without checking the transition
    pub fn promote(&self, device_id: &DeviceId, state: EntryState) -> bool {
        let mut entries = self.entries.lock();
        match entries.iter_mut().find(|e| &e.device_id == device_id) {
            Some(entry) => {
                let previous = entry.state;
                entry.state = state;
                log_allow_list_operation("promote", device_id, state, Some(previous));
                true
            }
            None => false,
        }
    }

    /// Entries still consuming a commissioning slot (anything not `Joined`)
    pub fn count_active(&self) -> usize {
        let entries = self.entries.lock();
        entries
            .iter()
            .filter(|e| e.state != EntryState::Joined)
            .count()
    }

    pub fn count_pending(&self) -> usize {
        let entries = self.entries.lock();
        entries.iter().filter(|e| e.state.is_pending()).count()
    }

    pub fn join_status(&self, device_id: &DeviceId) -> JoinStatus {
        self.find(device_id)
            .map(|e| e.join_status())
            .unwrap_or(JoinStatus::NotFound)
    }

    pub fn entries(&self) -> Vec<AllowListEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// JSON array of redacted entry views
    pub fn to_json(&self) -> Value {
        let entries = self.entries.lock();
        Value::Array(entries.iter().map(AllowListEntry::to_json).collect())
    }

    /// Apply a joiner event reported by the commissioning subsystem.
    ///
    /// `device_id` is `None` when the subsystem did not report an identity.
    /// `Finalized` promotes to `Joined`; `Removed` marks anything not yet
    /// joined as `JoinFailed` and then checks whether joiners remain.
    pub fn handle_joiner_event(
        &self,
        event: JoinerEvent,
        device_id: Option<DeviceId>,
    ) -> JoinerEventOutcome {
        let mut entries = self.entries.lock();

        let index = device_id
            .filter(|id| !id.is_null())
            .and_then(|id| entries.iter().position(|e| e.device_id == id));

        if index.is_none() && device_id.map_or(true, |id| id.is_null()) {
            warn!(event = %event, "⚠️ ALLOW_LIST: Unauthorized device join attempt");
            let pending_joiners = entries.iter().filter(|e| e.state.is_pending()).count();
            return JoinerEventOutcome {
                pending_joiners,
                stop_recommended: false,
            };
        }

        debug!(event = %event, device_id = ?device_id, known = index.is_some(), "Joiner event");

        let mut check_pending = false;
        match event {
            JoinerEvent::Started | JoinerEvent::Connected | JoinerEvent::Ended => {}
            JoinerEvent::Finalized => {
                if let Some(i) = index {
                    let entry = &mut entries[i];
                    entry.state = EntryState::Joined;
                    info!(device_id = %entry.device_id, "✅ ALLOW_LIST: Device joined");
                }
            }
            JoinerEvent::Removed => {
                if let Some(i) = index {
                    let entry = &mut entries[i];
                    if entry.state != EntryState::Joined {
                        entry.state = EntryState::JoinFailed;
                        warn!(device_id = %entry.device_id, "❌ ALLOW_LIST: Joiner removed before joining");
                    }
                }
                check_pending = true;
            }
        }

        let pending_joiners = entries.iter().filter(|e| e.state.is_pending()).count();
        if check_pending && pending_joiners > 0 {
            info!(pending_joiners = pending_joiners, "📋 ALLOW_LIST: Joiners still pending");
        }
        JoinerEventOutcome {
            pending_joiners,
            stop_recommended: check_pending && pending_joiners == 0,
        }
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new()
    }
}
