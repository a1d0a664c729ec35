//! JSON snapshot export/import for `taskdeck`.
//!
//! A snapshot is a single JSON document:
//!
//! ```json
//! { "lists": [...], "tasks": [...],
//!   "metadata": { "version": 1, "exportedAt": "...", "counts": {...}, "checksum": "..." } }
//! ```
//!
//! Writes go to a temp file that is synced and then renamed over the
//! target, so readers never see a half-written document.

use crate::error::{Result, StoreError};
use crate::model::{List, Task};
use crate::storage::TaskStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{info, warn};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotCounts {
    pub lists: usize,
    pub tasks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub counts: SnapshotCounts,
    /// SHA-256 over the serialized lists and tasks. Older documents may
    /// omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub lists: Vec<List>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    pub metadata: SnapshotMetadata,
}

impl Snapshot {
    #[must_use]
    pub fn new(lists: Vec<List>, tasks: Vec<Task>, exported_at: DateTime<Utc>) -> Self {
        let checksum = content_hash(&lists, &tasks);
        let counts = SnapshotCounts {
            lists: lists.len(),
            tasks: tasks.len(),
        };
        Self {
            lists,
            tasks,
            metadata: SnapshotMetadata {
                version: SNAPSHOT_VERSION,
                exported_at,
                counts,
                checksum,
            },
        }
    }

    /// Check version, counts and checksum against the payload.
    ///
    /// # Errors
    ///
    /// Returns `Snapshot` describing the first mismatch found.
    pub fn verify(&self) -> Result<()> {
        if self.metadata.version > SNAPSHOT_VERSION {
            return Err(StoreError::Snapshot(format!(
                "unsupported snapshot version {} (newest known is {SNAPSHOT_VERSION})",
                self.metadata.version
            )));
        }
        let counts = self.metadata.counts;
        if counts.lists != self.lists.len() || counts.tasks != self.tasks.len() {
            return Err(StoreError::Snapshot(format!(
                "metadata counts {}/{} do not match payload {}/{}",
                counts.lists,
                counts.tasks,
                self.lists.len(),
                self.tasks.len()
            )));
        }
        if let Some(expected) = &self.metadata.checksum {
            let actual = content_hash(&self.lists, &self.tasks);
            if actual.as_ref() != Some(expected) {
                return Err(StoreError::Snapshot(
                    "checksum mismatch; the document was modified or truncated".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Hex SHA-256 over the JSON encoding of `lists` then `tasks`.
fn content_hash(lists: &[List], tasks: &[Task]) -> Option<String> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(lists).ok()?);
    hasher.update(b"\n");
    hasher.update(serde_json::to_vec(tasks).ok()?);
    Some(format!("{:x}", hasher.finalize()))
}

/// Write `snapshot` to `path` atomically.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created, or if
/// serialization, writing, syncing or the final rename fails.
pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let parent_dir = path
        .parent()
        .ok_or_else(|| StoreError::Config(format!("Invalid snapshot path: {}", path.display())))?;
    if !parent_dir.as_os_str().is_empty() {
        fs::create_dir_all(parent_dir)?;
    }

    let temp_path = path.with_extension("json.tmp");
    let temp_file = File::create(&temp_path)?;
    let mut writer = BufWriter::new(temp_file);
    serde_json::to_writer_pretty(&mut writer, snapshot)?;
    writer.write_all(b"\n")?;

    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| StoreError::Io(e.into_error()))?
        .sync_all()?;

    fs::rename(&temp_path, path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        let _ = fs::set_permissions(path, perms);
    }

    info!(
        path = %path.display(),
        lists = snapshot.metadata.counts.lists,
        tasks = snapshot.metadata.counts.tasks,
        "Wrote snapshot"
    );
    Ok(())
}

/// Read and verify a snapshot document.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid JSON, or fails
/// [`Snapshot::verify`].
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let contents = fs::read_to_string(path)?;
    let snapshot: Snapshot = serde_json::from_str(&contents)?;
    snapshot.verify()?;
    info!(
        path = %path.display(),
        lists = snapshot.lists.len(),
        tasks = snapshot.tasks.len(),
        "Read snapshot"
    );
    Ok(snapshot)
}

/// Export on a background thread. Failures are logged, never returned.
///
/// The state is copied under the read lock on the spawned thread, so the
/// caller's mutation is never held up by file I/O.
pub fn spawn_export(store: Arc<TaskStore>, path: PathBuf) -> JoinHandle<()> {
    std::thread::spawn(move || {
        if let Err(err) = store.export_to(&path) {
            warn!(path = %path.display(), error = %err, "Background snapshot export failed");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewList, NewTask};
    use chrono::TimeZone;

    fn sample() -> Snapshot {
        let at = Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap();
        let list = NewList::named("Work").into_list(at);
        let task = NewTask::new(&list.id, "a").with_deadline(at).into_task(at);
        Snapshot::new(vec![list], vec![task], at)
    }

    #[test]
    fn metadata_uses_camel_case_and_iso_dates() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["metadata"]["version"], 1);
        assert_eq!(json["metadata"]["exportedAt"], "2025-07-01T12:00:00Z");
        assert_eq!(json["metadata"]["counts"]["tasks"], 1);
        assert_eq!(json["tasks"][0]["deadline"], "2025-07-01T12:00:00Z");
    }

    #[test]
    fn verify_detects_tampering() {
        let mut snapshot = sample();
        assert!(snapshot.verify().is_ok());
        snapshot.tasks[0].title = "edited".to_string();
        assert!(matches!(snapshot.verify(), Err(StoreError::Snapshot(_))));
    }

    #[test]
    fn verify_accepts_missing_checksum() {
        let mut snapshot = sample();
        snapshot.metadata.checksum = None;
        assert!(snapshot.verify().is_ok());
    }

    #[test]
    fn verify_rejects_future_version() {
        let mut snapshot = sample();
        snapshot.metadata.version = SNAPSHOT_VERSION + 1;
        assert!(snapshot.verify().is_err());
    }
}
