//! In-memory storage layer for `taskdeck`.
//!
//! This module provides the record store with:
//! - Keyed list and task records with insertion order
//! - Secondary task indexes kept in step with every mutation
//! - A capacity bound checked inside the insert critical section
//! - A single read-write lock around all of the above
//!
//! # Submodules
//!
//! - [`capacity`] - Record count limit
//! - [`index`] - Secondary task indexes
//! - [`records`] - Unsynchronized record store
//! - [`store`] - Locked, shareable store handle

pub mod capacity;
pub mod index;
pub mod records;
pub mod store;

pub use capacity::{CapacityGuard, DEFAULT_MAX_CAPACITY};
pub use index::TaskIndexes;
pub use records::RecordStore;
pub use store::{Clock, StoreStats, TaskStore};
