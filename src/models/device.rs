//! # Device Identity
//!
//! Fixed-width hardware identity (EUI-64) of a device asking to join the
//! network. Parsed from exactly sixteen hexadecimal digits and rendered in
//! lowercase. The all-zero identity is the wildcard "any joiner" value.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::admission::DEVICE_ID_LENGTH;
use crate::error::TaskerError;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId([u8; DEVICE_ID_LENGTH]);

impl DeviceId {
    /// Wildcard identity accepted only when any joiner is allowed
    pub const NULL: DeviceId = DeviceId([0; DEVICE_ID_LENGTH]);

    pub fn from_bytes(bytes: [u8; DEVICE_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DEVICE_ID_LENGTH] {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Parse sixteen hex digits (either case) into the binary identity
    pub fn parse(value: &str) -> Result<Self, TaskerError> {
        if value.len() != DEVICE_ID_LENGTH * 2 {
            return Err(TaskerError::ValidationError(format!(
                "Device identity must be {} hex digits, got {} characters",
                DEVICE_ID_LENGTH * 2,
                value.len()
            )));
        }

        let mut bytes = [0_u8; DEVICE_ID_LENGTH];
        for (index, pair) in value.as_bytes().chunks(2).enumerate() {
            let high = hex_value(pair[0]);
            let low = hex_value(pair[1]);
            match (high, low) {
                (Some(high), Some(low)) => bytes[index] = (high << 4) | low,
                _ => {
                    return Err(TaskerError::ValidationError(format!(
                        "Device identity '{value}' is not hexadecimal"
                    )))
                }
            }
        }
        Ok(Self(bytes))
    }
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({self})")
    }
}

impl FromStr for DeviceId {
    type Err = TaskerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DeviceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DeviceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
