//! # Exclusive Region
//!
//! A named mutual-exclusion region around one piece of shared state,
//! acquirable in blocking, non-blocking or timed mode. Each shared structure
//! owns exactly one region; callers pick the mode that suits their context.
//!
//! ```rust
//! use std::time::Duration;
//! use tasker_admission::sync::{ExclusiveRegion, LockMode};
//!
//! let region = ExclusiveRegion::new("counter", 0_u32);
//! {
//!     let mut guard = region.acquire(LockMode::Blocking).unwrap();
//!     *guard += 1;
//! }
//! let guard = region.acquire(LockMode::Timed(Duration::from_millis(5))).unwrap();
//! assert_eq!(*guard, 1);
//! ```

use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::trace;

/// Guard returned by a successful acquisition; the region is released on drop
pub type RegionGuard<'a, T> = MutexGuard<'a, T>;

/// Acquisition mode for an [`ExclusiveRegion`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Wait as long as it takes
    Blocking,
    /// Fail immediately when the region is held
    NonBlocking,
    /// Wait up to the given duration
    Timed(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    #[error("region '{region}' is held by another caller")]
    WouldBlock { region: String },
    #[error("timed out after {waited:?} waiting for region '{region}'")]
    TimedOut { region: String, waited: Duration },
}

pub struct ExclusiveRegion<T> {
    name: &'static str,
    inner: Mutex<T>,
}

impl<T> ExclusiveRegion<T> {
    pub fn new(name: &'static str, value: T) -> Self {
        Self {
            name,
            inner: Mutex::new(value),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Acquire the region using the requested mode
    pub fn acquire(&self, mode: LockMode) -> Result<RegionGuard<'_, T>, LockError> {
        trace!(region = self.name, ?mode, "acquiring exclusive region");
        match mode {
            LockMode::Blocking => Ok(self.inner.lock()),
            LockMode::NonBlocking => self.inner.try_lock().ok_or_else(|| LockError::WouldBlock {
                region: self.name.to_string(),
            }),
            LockMode::Timed(waited) => {
                self.inner
                    .try_lock_for(waited)
                    .ok_or_else(|| LockError::TimedOut {
                        region: self.name.to_string(),
                        waited,
                    })
            }
        }
    }

    /// Blocking acquisition, the mode used for every queue and allow-list mutation
    pub fn lock(&self) -> RegionGuard<'_, T> {
        self.inner.lock()
    }

    pub fn try_lock(&self) -> Result<RegionGuard<'_, T>, LockError> {
        self.acquire(LockMode::NonBlocking)
    }

    pub fn lock_for(&self, timeout: Duration) -> Result<RegionGuard<'_, T>, LockError> {
        self.acquire(LockMode::Timed(timeout))
    }

    /// Whether some caller currently holds the region
    pub fn is_held(&self) -> bool {
        self.inner.is_locked()
    }
}

impl<T: Default> Default for ExclusiveRegion<T> {
    fn default() -> Self {
        Self::new("unnamed", T::default())
    }
}

impl<T> fmt::Debug for ExclusiveRegion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExclusiveRegion")
            .field("name", &self.name)
            .field("held", &self.is_held())
            .finish()
    }
}
