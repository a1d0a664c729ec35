//! Secondary indexes over task records.
//!
//! Four maps from key to set-of-task-ids: by owning list, by status, by
//! priority and by deadline day (UTC). Every mutation goes through
//! [`TaskIndexes::reindex`], and empty buckets are pruned as soon as their
//! last id leaves, so the maps never hold stale or empty keys.

use crate::model::{Priority, Status, Task};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};

pub type IdSet = HashSet<String>;

#[derive(Debug, Clone, Default)]
pub struct TaskIndexes {
    by_list: BTreeMap<String, IdSet>,
    by_status: BTreeMap<Status, IdSet>,
    by_priority: BTreeMap<Priority, IdSet>,
    /// Tasks without a deadline are absent from this map.
    by_deadline_day: BTreeMap<NaiveDate, IdSet>,
}

fn insert_id<K: Ord>(map: &mut BTreeMap<K, IdSet>, key: K, id: &str) {
    map.entry(key).or_default().insert(id.to_string());
}

fn remove_id<K: Ord>(map: &mut BTreeMap<K, IdSet>, key: &K, id: &str) {
    if let Some(bucket) = map.get_mut(key) {
        bucket.remove(id);
        if bucket.is_empty() {
            map.remove(key);
        }
    }
}

impl TaskIndexes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The single entry point for index maintenance.
    ///
    /// `old` is the task as currently indexed (if any), `new` is the state to
    /// index (if any). Create is `(None, Some)`, delete is `(Some, None)`,
    /// update is `(Some, Some)`.
    pub fn reindex(&mut self, old: Option<&Task>, new: Option<&Task>) {
        if let Some(task) = old {
            self.deindex(task);
        }
        if let Some(task) = new {
            self.index(task);
        }
    }

    fn index(&mut self, task: &Task) {
        insert_id(&mut self.by_list, task.list_id.clone(), &task.id);
        insert_id(&mut self.by_status, task.status, &task.id);
        insert_id(&mut self.by_priority, task.priority, &task.id);
        if let Some(day) = task.deadline_day() {
            insert_id(&mut self.by_deadline_day, day, &task.id);
        }
    }

    fn deindex(&mut self, task: &Task) {
        remove_id(&mut self.by_list, &task.list_id, &task.id);
        remove_id(&mut self.by_status, &task.status, &task.id);
        remove_id(&mut self.by_priority, &task.priority, &task.id);
        if let Some(day) = task.deadline_day() {
            remove_id(&mut self.by_deadline_day, &day, &task.id);
        }
    }

    #[must_use]
    pub fn by_list(&self, list_id: &str) -> Option<&IdSet> {
        self.by_list.get(list_id)
    }

    #[must_use]
    pub fn by_status(&self, status: Status) -> Option<&IdSet> {
        self.by_status.get(&status)
    }

    #[must_use]
    pub fn by_priority(&self, priority: Priority) -> Option<&IdSet> {
        self.by_priority.get(&priority)
    }

    #[must_use]
    pub fn by_deadline_day(&self, day: NaiveDate) -> Option<&IdSet> {
        self.by_deadline_day.get(&day)
    }

    /// Number of tasks indexed under a list.
    #[must_use]
    pub fn list_count(&self, list_id: &str) -> usize {
        self.by_list.get(list_id).map_or(0, HashSet::len)
    }

    #[must_use]
    pub fn status_count(&self, status: Status) -> usize {
        self.by_status.get(&status).map_or(0, HashSet::len)
    }

    #[must_use]
    pub fn priority_count(&self, priority: Priority) -> usize {
        self.by_priority.get(&priority).map_or(0, HashSet::len)
    }

    /// Union of the day-buckets in the inclusive range `[from, to]`.
    ///
    /// Walks calendar days one at a time, so cost scales with the width of
    /// the range. When the range has more days than there are populated
    /// buckets, the ordered map is ranged over instead; both paths return
    /// the same ids.
    #[must_use]
    pub fn by_deadline_range(&self, from: NaiveDate, to: NaiveDate) -> IdSet {
        let mut ids = IdSet::new();
        if from > to {
            return ids;
        }

        let days = usize::try_from((to - from).num_days()).unwrap_or(usize::MAX);
        if days >= self.by_deadline_day.len() {
            for bucket in self.by_deadline_day.range(from..=to).map(|(_, b)| b) {
                ids.extend(bucket.iter().cloned());
            }
            return ids;
        }

        for day in from.iter_days().take_while(|day| *day <= to) {
            if let Some(bucket) = self.by_deadline_day.get(&day) {
                ids.extend(bucket.iter().cloned());
            }
        }
        ids
    }

    /// Number of non-empty buckets across all four indexes.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.by_list.len()
            + self.by_status.len()
            + self.by_priority.len()
            + self.by_deadline_day.len()
    }

    /// Every (index name, bucket key) pair that holds `task_id`.
    ///
    /// Linear in the number of buckets; meant for consistency checks.
    #[must_use]
    pub fn memberships(&self, task_id: &str) -> Vec<(&'static str, String)> {
        let mut found = Vec::new();
        for (key, bucket) in &self.by_list {
            if bucket.contains(task_id) {
                found.push(("list", key.clone()));
            }
        }
        for (key, bucket) in &self.by_status {
            if bucket.contains(task_id) {
                found.push(("status", key.to_string()));
            }
        }
        for (key, bucket) in &self.by_priority {
            if bucket.contains(task_id) {
                found.push(("priority", key.to_string()));
            }
        }
        for (key, bucket) in &self.by_deadline_day {
            if bucket.contains(task_id) {
                found.push(("deadline", key.format("%Y-%m-%d").to_string()));
            }
        }
        found
    }

    /// Whether any bucket in any index is empty. Always false after a
    /// completed mutation.
    #[must_use]
    pub fn has_empty_buckets(&self) -> bool {
        self.by_list.values().any(HashSet::is_empty)
            || self.by_status.values().any(HashSet::is_empty)
            || self.by_priority.values().any(HashSet::is_empty)
            || self.by_deadline_day.values().any(HashSet::is_empty)
    }
}
