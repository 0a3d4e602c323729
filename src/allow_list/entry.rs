use serde_json::{json, Value};

use crate::constants::{admission, attributes};
use crate::identifier::Identifier;
use crate::models::{DeviceId, JoinCredential};
use crate::state_machine::{EntryState, JoinStatus};

/// A device permitted (or previously permitted) to join
#[derive(Debug, Clone, PartialEq)]
pub struct AllowListEntry {
    pub device_id: DeviceId,
    /// Correlation identifier assigned when the entry was created
    pub entry_id: Identifier,
    pub timeout_secs: u32,
    pub credential: JoinCredential,
    pub state: EntryState,
}

impl AllowListEntry {
    pub fn new(device_id: DeviceId, timeout_secs: u32, credential: JoinCredential) -> Self {
        Self {
            device_id,
            entry_id: Identifier::generate(),
            timeout_secs,
            credential,
            state: EntryState::New,
        }
    }

    pub fn join_status(&self) -> JoinStatus {
        self.state.join_status()
    }

    /// Caller-facing view; the credential is never included
    pub fn to_json(&self) -> Value {
        json!({
            attributes::UUID: self.entry_id.to_string(),
            attributes::TYPE: admission::ADD_THREAD_DEVICE_TASK,
            attributes::ATTRIBUTES: {
                attributes::ACTIVATION_KEY: {
                    attributes::DEVICE_ID: self.device_id.to_string(),
                }
            },
            attributes::TIMEOUT: self.timeout_secs,
            attributes::STATE: self.state.to_string(),
        })
    }
}
