//! Canonical list and task records plus the indexes derived from them.
//!
//! [`RecordStore`] is not synchronized on its own. [`super::TaskStore`] wraps
//! it in a single lock so each method here runs as one critical section.
//!
//! Every mutating method validates first and only then touches records and
//! indexes, so an error never leaves a half-applied change behind.

use crate::error::{Result, StoreError};
use crate::model::{List, ListPatch, NewList, NewTask, Priority, Status, Task, TaskPatch};
use crate::storage::capacity::CapacityGuard;
use crate::storage::index::TaskIndexes;
use crate::validation;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// A record plus its insertion sequence number.
///
/// The sequence number is the tie-break for every sort, which keeps query
/// output deterministic when sort keys are equal.
#[derive(Debug, Clone)]
pub struct Slot<T> {
    pub seq: u64,
    pub record: T,
}

#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    lists: HashMap<String, Slot<List>>,
    tasks: HashMap<String, Slot<Task>>,
    /// Lower-cased list name -> list id. Enforces case-insensitive uniqueness.
    names: HashMap<String, String>,
    indexes: TaskIndexes,
    guard: CapacityGuard,
    next_seq: u64,
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn index_key_changed(old: &Task, new: &Task) -> bool {
    old.list_id != new.list_id
        || old.status != new.status
        || old.priority != new.priority
        || old.deadline_day() != new.deadline_day()
}

impl RecordStore {
    #[must_use]
    pub fn new(guard: CapacityGuard) -> Self {
        Self {
            guard,
            ..Self::default()
        }
    }

    /// Rebuild a store from previously exported records.
    ///
    /// Derived fields are recomputed: `tasks_count` from the rebuilt list
    /// index, `completed_at` from each task's status.
    ///
    /// # Errors
    ///
    /// - `CapacityExceeded` if the records do not fit
    /// - `Snapshot` on duplicate ids or a field that fails validation
    /// - `Conflict` on duplicate list names
    /// - `InvalidState` if a task references a missing list
    pub fn restore(guard: CapacityGuard, lists: Vec<List>, tasks: Vec<Task>) -> Result<Self> {
        guard.check_bulk(0, lists.len() + tasks.len())?;

        let mut store = Self::new(guard);
        for mut list in lists {
            validation::validate_list_record(&list)
                .map_err(|err| StoreError::Snapshot(format!("list {}: {err}", list.id)))?;
            if store.lists.contains_key(&list.id) {
                return Err(StoreError::Snapshot(format!("duplicate list id {}", list.id)));
            }
            let key = name_key(&list.name);
            if store.names.contains_key(&key) {
                return Err(StoreError::conflict(format!(
                    "duplicate list name '{}'",
                    list.name
                )));
            }
            list.tasks_count = 0;
            store.names.insert(key, list.id.clone());
            let seq = store.bump_seq();
            store.lists.insert(list.id.clone(), Slot { seq, record: list });
        }

        for mut task in tasks {
            validation::validate_task_record(&task)
                .map_err(|err| StoreError::Snapshot(format!("task {}: {err}", task.id)))?;
            if store.tasks.contains_key(&task.id) {
                return Err(StoreError::Snapshot(format!("duplicate task id {}", task.id)));
            }
            if !store.lists.contains_key(&task.list_id) {
                return Err(StoreError::invalid_state(format!(
                    "task {} references missing list {}",
                    task.id, task.list_id
                )));
            }
            task.completed_at = match task.status {
                Status::Completed => task.completed_at.or(Some(task.updated_at)),
                Status::Pending => None,
            };
            store.indexes.reindex(None, Some(&task));
            let seq = store.bump_seq();
            store.tasks.insert(task.id.clone(), Slot { seq, record: task });
        }

        for slot in store.lists.values_mut() {
            slot.record.tasks_count = store.indexes.list_count(&slot.record.id);
        }

        Ok(store)
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Total number of records counted against capacity.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lists.len() + self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn list_len(&self) -> usize {
        self.lists.len()
    }

    #[must_use]
    pub fn task_len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub const fn capacity(&self) -> CapacityGuard {
        self.guard
    }

    #[must_use]
    pub const fn indexes(&self) -> &TaskIndexes {
        &self.indexes
    }

    #[must_use]
    pub fn list(&self, id: &str) -> Option<&Slot<List>> {
        self.lists.get(id)
    }

    #[must_use]
    pub fn task(&self, id: &str) -> Option<&Slot<Task>> {
        self.tasks.get(id)
    }

    pub fn lists(&self) -> impl Iterator<Item = &Slot<List>> {
        self.lists.values()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Slot<Task>> {
        self.tasks.values()
    }

    /// Lists in insertion order.
    #[must_use]
    pub fn lists_ordered(&self) -> Vec<&List> {
        let mut slots: Vec<&Slot<List>> = self.lists.values().collect();
        slots.sort_by_key(|slot| slot.seq);
        slots.into_iter().map(|slot| &slot.record).collect()
    }

    /// Tasks in insertion order.
    #[must_use]
    pub fn tasks_ordered(&self) -> Vec<&Task> {
        let mut slots: Vec<&Slot<Task>> = self.tasks.values().collect();
        slots.sort_by_key(|slot| slot.seq);
        slots.into_iter().map(|slot| &slot.record).collect()
    }

    fn ensure_unique_name(&self, name: &str, except_id: Option<&str>) -> Result<()> {
        match self.names.get(&name_key(name)) {
            Some(owner) if Some(owner.as_str()) != except_id => Err(StoreError::conflict(format!(
                "a list named '{}' already exists",
                name.trim()
            ))),
            _ => Ok(()),
        }
    }

    /// Recompute `tasks_count` for a list from the list index, refreshing
    /// `updated_at` when the count moved.
    fn refresh_tasks_count(&mut self, list_id: &str, now: DateTime<Utc>) {
        let count = self.indexes.list_count(list_id);
        if let Some(slot) = self.lists.get_mut(list_id) {
            if slot.record.tasks_count != count {
                slot.record.tasks_count = count;
                slot.record.updated_at = now;
            }
        }
    }

    // =========================================================================
    // Lists
    // =========================================================================

    /// Insert a new list.
    ///
    /// # Errors
    ///
    /// `Validation`, `Conflict` on a duplicate name, or `CapacityExceeded`.
    pub fn create_list(&mut self, new: NewList, now: DateTime<Utc>) -> Result<List> {
        validation::validate_new_list(&new)?;
        self.ensure_unique_name(&new.name, None)?;
        self.guard.check(self.len())?;

        let list = new.into_list(now);
        self.names.insert(name_key(&list.name), list.id.clone());
        let seq = self.bump_seq();
        self.lists.insert(
            list.id.clone(),
            Slot {
                seq,
                record: list.clone(),
            },
        );

        debug!(list_id = %list.id, name = %list.name, "Created list");
        Ok(list)
    }

    /// Merge a patch into a list.
    ///
    /// # Errors
    ///
    /// `Validation`, `NotFound`, or `Conflict` when renaming onto an
    /// existing name.
    pub fn update_list(&mut self, id: &str, patch: &ListPatch, now: DateTime<Utc>) -> Result<List> {
        validation::validate_list_patch(patch)?;
        let old_name = self
            .lists
            .get(id)
            .map(|slot| slot.record.name.clone())
            .ok_or_else(|| StoreError::list_not_found(id))?;
        if let Some(name) = &patch.name {
            self.ensure_unique_name(name, Some(id))?;
        }

        let slot = self
            .lists
            .get_mut(id)
            .ok_or_else(|| StoreError::list_not_found(id))?;
        patch.apply(&mut slot.record, now);
        let list = slot.record.clone();

        if name_key(&old_name) != name_key(&list.name) {
            self.names.remove(&name_key(&old_name));
            self.names.insert(name_key(&list.name), list.id.clone());
        }

        debug!(list_id = %id, "Updated list");
        Ok(list)
    }

    /// Remove a list.
    ///
    /// With `cascade`, every task in the list is deleted first through the
    /// regular task-delete path. Without it, a list that still owns tasks is
    /// left alone.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `InvalidState` when `cascade` is false and the list is
    /// not empty.
    pub fn delete_list(&mut self, id: &str, cascade: bool, now: DateTime<Utc>) -> Result<List> {
        if !self.lists.contains_key(id) {
            return Err(StoreError::list_not_found(id));
        }

        let owned: Vec<String> = self
            .indexes
            .by_list(id)
            .map(|bucket| bucket.iter().cloned().collect())
            .unwrap_or_default();
        if !owned.is_empty() && !cascade {
            return Err(StoreError::invalid_state(format!(
                "list {id} still has {} task(s); delete with cascade",
                owned.len()
            )));
        }

        for task_id in &owned {
            self.remove_task(task_id, now);
        }

        let slot = self
            .lists
            .remove(id)
            .ok_or_else(|| StoreError::list_not_found(id))?;
        self.names.remove(&name_key(&slot.record.name));

        debug!(list_id = %id, cascaded = owned.len(), "Deleted list");
        Ok(slot.record)
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    /// Insert a new task into an existing list.
    ///
    /// # Errors
    ///
    /// `Validation`, `NotFound` if the list does not exist, or
    /// `CapacityExceeded`.
    pub fn create_task(&mut self, new: NewTask, now: DateTime<Utc>) -> Result<Task> {
        validation::validate_new_task(&new)?;
        if !self.lists.contains_key(&new.list_id) {
            return Err(StoreError::list_not_found(&new.list_id));
        }
        self.guard.check(self.len())?;

        let task = new.into_task(now);
        self.indexes.reindex(None, Some(&task));
        let seq = self.bump_seq();
        self.tasks.insert(
            task.id.clone(),
            Slot {
                seq,
                record: task.clone(),
            },
        );
        self.refresh_tasks_count(&task.list_id, now);

        debug!(task_id = %task.id, list_id = %task.list_id, "Created task");
        Ok(task)
    }

    /// Merge a patch into a task, moving it between index buckets when any
    /// indexed field changes.
    ///
    /// # Errors
    ///
    /// `Validation`, `NotFound`, or `InvalidState` if the patch moves the
    /// task to a list that does not exist.
    pub fn update_task(&mut self, id: &str, patch: &TaskPatch, now: DateTime<Utc>) -> Result<Task> {
        validation::validate_task_patch(patch)?;
        let old = self
            .tasks
            .get(id)
            .map(|slot| slot.record.clone())
            .ok_or_else(|| StoreError::task_not_found(id))?;
        if let Some(target) = &patch.list_id {
            if !self.lists.contains_key(target) {
                return Err(StoreError::invalid_state(format!(
                    "cannot move task {id} to missing list {target}"
                )));
            }
        }

        let mut new = old.clone();
        patch.apply(&mut new, now);
        self.replace_task(&old, new, now)
    }

    /// Flip a task between pending and completed.
    ///
    /// # Errors
    ///
    /// `NotFound` if the task does not exist.
    pub fn toggle_task(&mut self, id: &str, now: DateTime<Utc>) -> Result<Task> {
        let old = self
            .tasks
            .get(id)
            .map(|slot| slot.record.clone())
            .ok_or_else(|| StoreError::task_not_found(id))?;

        let mut new = old.clone();
        new.set_status(old.status.toggled(), now);
        new.updated_at = now;
        self.replace_task(&old, new, now)
    }

    fn replace_task(&mut self, old: &Task, new: Task, now: DateTime<Utc>) -> Result<Task> {
        if index_key_changed(old, &new) {
            self.indexes.reindex(Some(old), Some(&new));
        }

        let slot = self
            .tasks
            .get_mut(&old.id)
            .ok_or_else(|| StoreError::task_not_found(&old.id))?;
        slot.record = new.clone();

        if old.list_id != new.list_id {
            self.refresh_tasks_count(&old.list_id, now);
            self.refresh_tasks_count(&new.list_id, now);
            debug!(task_id = %new.id, from = %old.list_id, to = %new.list_id, "Moved task");
        }

        debug!(task_id = %new.id, status = %new.status, priority = %new.priority, "Updated task");
        Ok(new)
    }

    /// Remove a task.
    ///
    /// # Errors
    ///
    /// `NotFound` if the task does not exist.
    pub fn delete_task(&mut self, id: &str, now: DateTime<Utc>) -> Result<Task> {
        let task = self
            .remove_task(id, now)
            .ok_or_else(|| StoreError::task_not_found(id))?;
        debug!(task_id = %id, list_id = %task.list_id, "Deleted task");
        Ok(task)
    }

    fn remove_task(&mut self, id: &str, now: DateTime<Utc>) -> Option<Task> {
        let slot = self.tasks.remove(id)?;
        self.indexes.reindex(Some(&slot.record), None);
        self.refresh_tasks_count(&slot.record.list_id, now);
        Some(slot.record)
    }

    // =========================================================================
    // Consistency
    // =========================================================================

    /// Check every store invariant, returning a description of each
    /// violation found.
    #[must_use]
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.len() > self.guard.max() {
            problems.push(format!(
                "{} records exceed capacity {}",
                self.len(),
                self.guard.max()
            ));
        }

        for slot in self.lists.values() {
            let list = &slot.record;
            let live = self.tasks.values().filter(|t| t.record.list_id == list.id).count();
            if list.tasks_count != live {
                problems.push(format!(
                    "list {} has tasks_count {} but {live} live tasks",
                    list.id, list.tasks_count
                ));
            }
            if self.names.get(&name_key(&list.name)) != Some(&list.id) {
                problems.push(format!("list {} missing from name index", list.id));
            }
        }
        if self.names.len() != self.lists.len() {
            problems.push("name index has stale entries".to_string());
        }

        let mut indexed = 0;
        for slot in self.tasks.values() {
            let task = &slot.record;
            if !self.lists.contains_key(&task.list_id) {
                problems.push(format!("task {} references missing list {}", task.id, task.list_id));
            }
            if task.completed_at.is_some() != task.is_completed() {
                problems.push(format!("task {} has inconsistent completed_at", task.id));
            }

            let mut expected: HashSet<(&str, String)> = HashSet::from([
                ("list", task.list_id.clone()),
                ("status", task.status.to_string()),
                ("priority", task.priority.to_string()),
            ]);
            if let Some(day) = task.deadline_day() {
                expected.insert(("deadline", day.format("%Y-%m-%d").to_string()));
            }
            let actual: HashSet<(&str, String)> =
                self.indexes.memberships(&task.id).into_iter().collect();
            if actual != expected {
                problems.push(format!(
                    "task {} indexed under {actual:?}, expected {expected:?}",
                    task.id
                ));
            }
            indexed += 1;
        }

        let status_total: usize = Status::ALL
            .iter()
            .map(|s| self.indexes.status_count(*s))
            .sum();
        let priority_total: usize = Priority::ALL
            .iter()
            .map(|p| self.indexes.priority_count(*p))
            .sum();
        if status_total != indexed || priority_total != indexed {
            problems.push(format!(
                "indexes hold {status_total}/{priority_total} ids for {indexed} tasks"
            ));
        }
        if self.indexes.has_empty_buckets() {
            problems.push("index holds an empty bucket".to_string());
        }

        problems
    }
}
