//! # Join Credential
//!
//! Secret a device presents when joining. The format policy accepts 6 to 32
//! characters drawn from `0-9` and `A-Z`, excluding the visually ambiguous
//! `I`, `O`, `Q` and `Z`. Lowercase input is rejected rather than folded.
//!
//! The credential never appears in `Debug` output and has no `Display` or
//! `Serialize` implementation; callers that must hand it to the
//! commissioning subsystem use [`JoinCredential::expose`].

use std::fmt;
use thiserror::Error;

use crate::constants::admission::{
    CREDENTIAL_EXCLUDED_CHARS, CREDENTIAL_MAX_LENGTH, CREDENTIAL_MIN_LENGTH,
};
use crate::error::TaskerError;

/// Reason a candidate credential violates the format policy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialViolation {
    #[error("credential length {length} is outside {CREDENTIAL_MIN_LENGTH}..={CREDENTIAL_MAX_LENGTH}")]
    Length { length: usize },
    #[error("credential contains a non-alphanumeric character")]
    NotAlphanumeric,
    #[error("credential contains lowercase characters")]
    Lowercase,
    #[error("credential contains the ambiguous character '{0}'")]
    Ambiguous(char),
}

impl From<CredentialViolation> for TaskerError {
    fn from(violation: CredentialViolation) -> Self {
        TaskerError::ValidationError(violation.to_string())
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct JoinCredential(String);

impl JoinCredential {
    /// Check a candidate against the format policy
    pub fn verify(candidate: &str) -> Result<(), CredentialViolation> {
        let length = candidate.chars().count();
        if !(CREDENTIAL_MIN_LENGTH..=CREDENTIAL_MAX_LENGTH).contains(&length) {
            return Err(CredentialViolation::Length { length });
        }
        for c in candidate.chars() {
            if !c.is_ascii_alphanumeric() {
                return Err(CredentialViolation::NotAlphanumeric);
            }
            if c.is_ascii_lowercase() {
                return Err(CredentialViolation::Lowercase);
            }
            if CREDENTIAL_EXCLUDED_CHARS.contains(&c) {
                return Err(CredentialViolation::Ambiguous(c));
            }
        }
        Ok(())
    }

    pub fn parse(candidate: &str) -> Result<Self, CredentialViolation> {
        Self::verify(candidate)?;
        Ok(Self(candidate.to_string()))
    }

    /// Raw secret, for the commissioning subsystem only
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for JoinCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JoinCredential(***)")
    }
}
