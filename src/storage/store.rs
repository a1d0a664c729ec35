//! Thread-safe handle over the record store and its indexes.

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::model::{List, ListPatch, NewList, NewTask, Priority, Status, Task, TaskPatch};
use crate::query::{self, ListFilters, Page, PageRequest, SortSpec, TaskFilters};
use crate::snapshot::{self, Snapshot};
use crate::storage::capacity::CapacityGuard;
use crate::storage::records::RecordStore;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Source of "now" for timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Aggregate counts, answered from index bucket sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub lists: usize,
    pub tasks: usize,
    pub pending: usize,
    pub completed: usize,
    pub high_priority: usize,
    pub medium_priority: usize,
    pub low_priority: usize,
    /// Non-empty buckets across all task indexes.
    pub index_buckets: usize,
    pub max_capacity: usize,
}

/// The store: lists, tasks and their indexes behind one read-write lock.
///
/// Construct once at startup and share through an `Arc`. Reads run
/// concurrently with each other; every mutation holds the write lock for
/// its whole duration, including capacity checks, index maintenance,
/// cascades and `tasks_count` refreshes.
pub struct TaskStore {
    state: RwLock<RecordStore>,
    clock: Clock,
    config: StoreConfig,
}

impl fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("TaskStore")
            .field("lists", &state.list_len())
            .field("tasks", &state.task_len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl TaskStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self::with_clock(config, Arc::new(Utc::now))
    }

    /// Create an empty store that reads time from `clock`.
    #[must_use]
    pub fn with_clock(config: StoreConfig, clock: Clock) -> Self {
        let guard = CapacityGuard::new(config.max_capacity);
        Self {
            state: RwLock::new(RecordStore::new(guard)),
            clock,
            config,
        }
    }

    /// Open a store, loading the configured snapshot file if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot exists but cannot be read or does
    /// not describe a consistent store.
    pub fn open(config: StoreConfig) -> Result<Self> {
        Self::open_with_clock(config, Arc::new(Utc::now))
    }

    /// [`Self::open`] with an explicit time source.
    ///
    /// # Errors
    ///
    /// Same as [`Self::open`].
    pub fn open_with_clock(config: StoreConfig, clock: Clock) -> Result<Self> {
        match config.snapshot_path.clone() {
            Some(path) if path.exists() => {
                let snapshot = snapshot::read_snapshot(&path)?;
                Self::from_snapshot_with_clock(config, snapshot, clock)
            }
            _ => Ok(Self::with_clock(config, clock)),
        }
    }

    /// Rebuild a store from a snapshot document.
    ///
    /// # Errors
    ///
    /// Returns an error if the records do not fit the configured capacity,
    /// contain duplicates, hold invalid fields, or reference missing lists.
    pub fn from_snapshot(config: StoreConfig, snapshot: Snapshot) -> Result<Self> {
        Self::from_snapshot_with_clock(config, snapshot, Arc::new(Utc::now))
    }

    /// [`Self::from_snapshot`] with an explicit time source.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_snapshot`].
    pub fn from_snapshot_with_clock(
        config: StoreConfig,
        snapshot: Snapshot,
        clock: Clock,
    ) -> Result<Self> {
        let guard = CapacityGuard::new(config.max_capacity);
        let list_count = snapshot.lists.len();
        let task_count = snapshot.tasks.len();
        let state = RecordStore::restore(guard, snapshot.lists, snapshot.tasks)?;
        info!(lists = list_count, tasks = task_count, "Loaded store from snapshot");
        Ok(Self {
            state: RwLock::new(state),
            clock,
            config,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    // =========================================================================
    // Lists
    // =========================================================================

    /// # Errors
    ///
    /// `Validation`, `Conflict` on a duplicate name, or `CapacityExceeded`.
    pub fn create_list(&self, new: NewList) -> Result<List> {
        let now = self.now();
        self.state.write().create_list(new, now)
    }

    /// # Errors
    ///
    /// `Validation`, `NotFound`, or `Conflict`.
    pub fn update_list(&self, id: &str, patch: &ListPatch) -> Result<List> {
        let now = self.now();
        self.state.write().update_list(id, patch, now)
    }

    /// # Errors
    ///
    /// `NotFound`, or `InvalidState` if the list has tasks and `cascade`
    /// is false.
    pub fn delete_list(&self, id: &str, cascade: bool) -> Result<List> {
        let now = self.now();
        self.state.write().delete_list(id, cascade, now)
    }

    /// # Errors
    ///
    /// `NotFound` if no list has this id.
    pub fn get_list(&self, id: &str) -> Result<List> {
        self.state
            .read()
            .list(id)
            .map(|slot| slot.record.clone())
            .ok_or_else(|| StoreError::list_not_found(id))
    }

    /// Copy of every list, in insertion order.
    #[must_use]
    pub fn all_lists(&self) -> Vec<List> {
        self.state.read().lists_ordered().into_iter().cloned().collect()
    }

    #[must_use]
    pub fn query_lists(&self, filters: &ListFilters, sort: SortSpec, page: PageRequest) -> Page<List> {
        query::query_lists(&self.state.read(), filters, sort, page)
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    /// # Errors
    ///
    /// `Validation`, `NotFound` if the list does not exist, or
    /// `CapacityExceeded`.
    pub fn create_task(&self, new: NewTask) -> Result<Task> {
        let now = self.now();
        self.state.write().create_task(new, now)
    }

    /// # Errors
    ///
    /// `Validation`, `NotFound`, or `InvalidState` when moving to a missing
    /// list.
    pub fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task> {
        let now = self.now();
        self.state.write().update_task(id, patch, now)
    }

    /// # Errors
    ///
    /// `NotFound` if no task has this id.
    pub fn toggle_task(&self, id: &str) -> Result<Task> {
        let now = self.now();
        self.state.write().toggle_task(id, now)
    }

    /// # Errors
    ///
    /// `NotFound` if no task has this id.
    pub fn delete_task(&self, id: &str) -> Result<Task> {
        let now = self.now();
        self.state.write().delete_task(id, now)
    }

    /// # Errors
    ///
    /// `NotFound` if no task has this id.
    pub fn get_task(&self, id: &str) -> Result<Task> {
        self.state
            .read()
            .task(id)
            .map(|slot| slot.record.clone())
            .ok_or_else(|| StoreError::task_not_found(id))
    }

    /// Copy of every task, in insertion order.
    #[must_use]
    pub fn all_tasks(&self) -> Vec<Task> {
        self.state.read().tasks_ordered().into_iter().cloned().collect()
    }

    #[must_use]
    pub fn query_tasks(&self, filters: &TaskFilters, sort: SortSpec, page: PageRequest) -> Page<Task> {
        query::query_tasks(&self.state.read(), filters, sort, page)
    }

    /// Tasks with a deadline on any UTC day in `[from, to]`.
    #[must_use]
    pub fn tasks_in_deadline_range(&self, from: NaiveDate, to: NaiveDate) -> Vec<Task> {
        query::tasks_in_deadline_range(&self.state.read(), from, to)
    }

    /// Pending tasks past their deadline, soonest first.
    #[must_use]
    pub fn overdue_tasks(&self, page: PageRequest) -> Page<Task> {
        self.query_tasks(&TaskFilters::overdue(self.now()), SortSpec::deadline_asc(), page)
    }

    /// Pending tasks due in the next seven days, soonest first.
    #[must_use]
    pub fn tasks_due_this_week(&self, page: PageRequest) -> Page<Task> {
        self.query_tasks(
            &TaskFilters::due_this_week(self.now()),
            SortSpec::deadline_asc(),
            page,
        )
    }

    // =========================================================================
    // Aggregates and maintenance
    // =========================================================================

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let state = self.state.read();
        let indexes = state.indexes();
        StoreStats {
            lists: state.list_len(),
            tasks: state.task_len(),
            pending: indexes.status_count(Status::Pending),
            completed: indexes.status_count(Status::Completed),
            high_priority: indexes.priority_count(Priority::High),
            medium_priority: indexes.priority_count(Priority::Medium),
            low_priority: indexes.priority_count(Priority::Low),
            index_buckets: indexes.bucket_count(),
            max_capacity: state.capacity().max(),
        }
    }

    /// Every invariant violation currently present. Empty for a healthy
    /// store.
    #[must_use]
    pub fn invariant_violations(&self) -> Vec<String> {
        self.state.read().invariant_violations()
    }

    /// Copy the full record set into a snapshot document.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let exported_at = self.now();
        let state = self.state.read();
        Snapshot::new(
            state.lists_ordered().into_iter().cloned().collect(),
            state.tasks_ordered().into_iter().cloned().collect(),
            exported_at,
        )
    }

    /// Write a snapshot to `path`. The read lock is released before any
    /// file I/O starts.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file I/O fails.
    pub fn export_to(&self, path: &Path) -> Result<Snapshot> {
        let snapshot = self.snapshot();
        snapshot::write_snapshot(path, &snapshot)?;
        debug!(path = %path.display(), "Exported snapshot");
        Ok(snapshot)
    }

    /// Write a snapshot to the configured snapshot path.
    ///
    /// # Errors
    ///
    /// Returns `Config` if no snapshot path is configured, or any export
    /// error.
    pub fn save(&self) -> Result<Snapshot> {
        let path = self
            .config
            .snapshot_path
            .clone()
            .ok_or_else(|| StoreError::Config("no snapshot path configured".to_string()))?;
        self.export_to(&path)
    }
}
