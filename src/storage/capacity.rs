//! Upper bound on the total number of records held by a store.

use crate::error::{Result, StoreError};
use tracing::warn;

/// Default maximum of `lists + tasks`.
pub const DEFAULT_MAX_CAPACITY: usize = 10_000;

/// Stateless check run at the start of every insert.
///
/// It reserves nothing. The store calls it while holding its write lock so
/// that the check and the insert form one critical section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityGuard {
    max: usize,
}

impl Default for CapacityGuard {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CAPACITY)
    }
}

impl CapacityGuard {
    #[must_use]
    pub const fn new(max: usize) -> Self {
        Self { max }
    }

    #[must_use]
    pub const fn max(&self) -> usize {
        self.max
    }

    /// Fail if one more record would not fit.
    ///
    /// # Errors
    ///
    /// Returns `CapacityExceeded` when `current >= max`.
    pub fn check(&self, current: usize) -> Result<()> {
        if current >= self.max {
            warn!(current, max = self.max, "Rejecting insert: store is full");
            return Err(StoreError::CapacityExceeded {
                max: self.max,
                current,
            });
        }
        Ok(())
    }

    /// Fail if `incoming` more records would not fit. Used by bulk loads.
    ///
    /// # Errors
    ///
    /// Returns `CapacityExceeded` when `current + incoming > max`.
    pub fn check_bulk(&self, current: usize, incoming: usize) -> Result<()> {
        let total = current.saturating_add(incoming);
        if total > self.max {
            return Err(StoreError::CapacityExceeded {
                max: self.max,
                current: total,
            });
        }
        Ok(())
    }
}
