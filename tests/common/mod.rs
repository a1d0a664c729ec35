#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use taskdeck::storage::Clock;
use taskdeck::{StoreConfig, TaskStore};

pub mod fixtures;

pub fn init_test_logging() {
    taskdeck::logging::init_test_logging();
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap()
}

pub fn config_with_capacity(max_capacity: usize) -> StoreConfig {
    StoreConfig {
        max_capacity,
        ..StoreConfig::default()
    }
}

/// Store with the default capacity and a real clock.
pub fn test_store() -> TaskStore {
    init_test_logging();
    TaskStore::new(StoreConfig::default())
}

/// Store whose clock never moves, so every timestamp ties.
pub fn frozen_store(max_capacity: usize) -> TaskStore {
    init_test_logging();
    let at = base_time();
    TaskStore::with_clock(config_with_capacity(max_capacity), Arc::new(move || at))
}

/// Store whose clock advances one second per reading.
pub fn ticking_store(max_capacity: usize) -> TaskStore {
    init_test_logging();
    let ticks = Arc::new(AtomicI64::new(0));
    let start = base_time();
    let clock: Clock = Arc::new(move || {
        let n = ticks.fetch_add(1, Ordering::SeqCst);
        start + chrono::Duration::seconds(n)
    });
    TaskStore::with_clock(config_with_capacity(max_capacity), clock)
}

/// Panic with every violation if the store is inconsistent.
pub fn assert_consistent(store: &TaskStore) {
    let violations = store.invariant_violations();
    assert!(violations.is_empty(), "invariant violations: {violations:#?}");
}
