//! Snapshot export/import through real files.

mod common;

use common::fixtures::{self, TaskBuilder, day};
use common::{assert_consistent, base_time, config_with_capacity, ticking_store};
use std::fs;
use std::sync::Arc;
use taskdeck::model::{Priority, Status};
use taskdeck::snapshot::{self, Snapshot};
use taskdeck::{StoreConfig, StoreError, TaskStore};
use tempfile::TempDir;

fn populated() -> TaskStore {
    let store = ticking_store(100);
    let work = fixtures::list(&store, "Work");
    let home = fixtures::list(&store, "Home");
    TaskBuilder::new(&work.id, "Report")
        .priority(Priority::High)
        .deadline(day(2025, 7, 10))
        .create(&store);
    TaskBuilder::new(&work.id, "Archive")
        .status(Status::Completed)
        .create(&store);
    TaskBuilder::new(&home.id, "Dishes")
        .description("before dinner")
        .create(&store);
    store
}

#[test]
fn export_then_open_restores_everything() {
    let store = populated();
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("data").join("snapshot.json");

    let written = store.export_to(&path).unwrap();
    assert_eq!(written.metadata.counts.lists, 2);
    assert_eq!(written.metadata.counts.tasks, 3);
    assert!(!path.with_extension("json.tmp").exists());

    let config = StoreConfig {
        snapshot_path: Some(path),
        ..config_with_capacity(100)
    };
    let restored = TaskStore::open(config).unwrap();

    assert_eq!(restored.all_lists(), store.all_lists());
    assert_eq!(restored.all_tasks(), store.all_tasks());
    assert_eq!(restored.stats(), store.stats());
    assert_consistent(&restored);
}

#[test]
fn open_without_file_starts_empty() {
    let dir = TempDir::new().expect("tempdir");
    let config = StoreConfig {
        snapshot_path: Some(dir.path().join("missing.json")),
        ..StoreConfig::default()
    };
    let store = TaskStore::open(config).unwrap();
    assert!(store.is_empty());
}

#[test]
fn save_uses_configured_path() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("store.json");
    let store = TaskStore::new(StoreConfig {
        snapshot_path: Some(path.clone()),
        ..StoreConfig::default()
    });
    fixtures::list(&store, "Inbox");
    store.save().unwrap();

    let document: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(document["metadata"]["counts"]["lists"], 1);
    assert_eq!(document["lists"][0]["name"], "Inbox");
    assert!(document["metadata"]["exportedAt"].is_string());
}

#[test]
fn tampered_file_is_rejected() {
    let store = populated();
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("snapshot.json");
    store.export_to(&path).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    fs::write(&path, contents.replace("Dishes", "Laundry")).unwrap();

    let err = snapshot::read_snapshot(&path).unwrap_err();
    assert!(matches!(err, StoreError::Snapshot(_)));
}

#[test]
fn restore_respects_capacity() {
    let snapshot = populated().snapshot();
    let err = TaskStore::from_snapshot(config_with_capacity(3), snapshot).unwrap_err();
    assert!(matches!(err, StoreError::CapacityExceeded { .. }));
}

#[test]
fn restore_rejects_dangling_list_reference() {
    let mut snapshot = populated().snapshot();
    snapshot.lists.retain(|l| l.name != "Home");
    let rebuilt = Snapshot::new(
        snapshot.lists,
        snapshot.tasks,
        snapshot.metadata.exported_at,
    );
    let err = TaskStore::from_snapshot(StoreConfig::default(), rebuilt).unwrap_err();
    assert!(matches!(err, StoreError::InvalidState { .. }));
}

#[test]
fn restore_rejects_blank_list_name() {
    let mut snapshot = populated().snapshot();
    snapshot.lists[0].name = "   ".to_string();
    let rebuilt = Snapshot::new(
        snapshot.lists,
        snapshot.tasks,
        snapshot.metadata.exported_at,
    );
    let err = TaskStore::from_snapshot(StoreConfig::default(), rebuilt).unwrap_err();
    assert!(matches!(err, StoreError::Snapshot(ref msg) if msg.contains("name")));
}

#[test]
fn open_rejects_file_with_invalid_fields() {
    let mut snapshot = populated().snapshot();
    snapshot.tasks[0].title = String::new();
    snapshot.lists[1].color = Some("not-a-color".to_string());
    let rebuilt = Snapshot::new(
        snapshot.lists,
        snapshot.tasks,
        snapshot.metadata.exported_at,
    );

    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("invalid.json");
    snapshot::write_snapshot(&path, &rebuilt).unwrap();

    let config = StoreConfig {
        snapshot_path: Some(path),
        ..StoreConfig::default()
    };
    let err = TaskStore::open(config).unwrap_err();
    assert!(matches!(err, StoreError::Snapshot(_)));
}

#[test]
fn restored_store_keeps_injected_clock() {
    let snapshot = populated().snapshot();
    let at = base_time();
    let restored = TaskStore::from_snapshot_with_clock(
        config_with_capacity(100),
        snapshot,
        Arc::new(move || at),
    )
    .unwrap();

    let list = fixtures::list(&restored, "Later");
    assert_eq!(list.created_at, at);
    assert_eq!(list.updated_at, at);
}

#[test]
fn background_export_writes_file() {
    let store = Arc::new(populated());
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("bg.json");

    snapshot::spawn_export(Arc::clone(&store), path.clone())
        .join()
        .expect("export thread");

    let loaded = snapshot::read_snapshot(&path).unwrap();
    assert_eq!(loaded.tasks.len(), 3);
}

#[test]
fn background_export_failure_is_swallowed() {
    let store = Arc::new(populated());
    let dir = TempDir::new().expect("tempdir");
    // A directory where the file should be makes the rename fail.
    let path = dir.path().join("occupied");
    fs::create_dir_all(path.join("child")).unwrap();

    snapshot::spawn_export(store, path.clone())
        .join()
        .expect("export thread must not panic");
    assert!(path.is_dir());
}
