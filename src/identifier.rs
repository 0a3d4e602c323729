//! # Identifiers
//!
//! Random unique identifiers naming queued tasks and allow-list entries.
//! Backed by RFC 4122 version 4 UUIDs and rendered in the canonical
//! hyphenated lowercase form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::TaskerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(Uuid);

impl Identifier {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parse the canonical 36-character form
    pub fn parse(value: &str) -> Result<Self, TaskerError> {
        if value.len() != 36 {
            return Err(TaskerError::ValidationError(format!(
                "Identifier must be 36 characters, got {}",
                value.len()
            )));
        }
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|e| TaskerError::ValidationError(format!("Invalid identifier '{value}': {e}")))
    }
}

impl From<Uuid> for Identifier {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for Identifier {
    type Err = TaskerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
