//! Query pipeline: candidate resolution, residual filter, sort, paginate.
//!
//! # Submodules
//!
//! - [`filter`] - Filter types and scan predicates
//! - [`sort`] - Sort specifications and comparators
//! - [`page`] - Offset/limit pagination

pub mod filter;
pub mod page;
pub mod sort;

pub use filter::{ListFilters, TaskFilters};
pub use page::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, Page, PageRequest};
pub use sort::{SortField, SortOrder, SortSpec};

use crate::model::{List, Task};
use crate::storage::index::IdSet;
use crate::storage::records::{RecordStore, Slot};
use chrono::NaiveDate;
use std::borrow::Cow;
use tracing::trace;

/// Index-derived candidate ids, or `None` when no filter is indexed and
/// the whole task set has to be scanned.
fn resolve_task_candidates(store: &RecordStore, filters: &TaskFilters) -> Option<IdSet> {
    let indexes = store.indexes();
    let mut sets: Vec<Cow<'_, IdSet>> = Vec::new();

    // A filter on a key with no bucket can match nothing.
    if let Some(list_id) = &filters.list_id {
        let Some(bucket) = indexes.by_list(list_id) else {
            return Some(IdSet::new());
        };
        sets.push(Cow::Borrowed(bucket));
    }
    if let Some(status) = filters.status {
        let Some(bucket) = indexes.by_status(status) else {
            return Some(IdSet::new());
        };
        sets.push(Cow::Borrowed(bucket));
    }
    if let Some(priority) = filters.priority {
        let Some(bucket) = indexes.by_priority(priority) else {
            return Some(IdSet::new());
        };
        sets.push(Cow::Borrowed(bucket));
    }
    if filters.has_deadline_bounds() {
        let from = filters
            .deadline_from
            .map_or(NaiveDate::MIN, |d| d.date_naive());
        let to = filters.deadline_to.map_or(NaiveDate::MAX, |d| d.date_naive());
        sets.push(Cow::Owned(indexes.by_deadline_range(from, to)));
    }

    if sets.is_empty() {
        return None;
    }

    sets.sort_by_key(|set| set.len());
    let (smallest, rest) = sets.split_first()?;
    let candidates = smallest
        .iter()
        .filter(|id| rest.iter().all(|set| set.contains(*id)))
        .cloned()
        .collect();
    Some(candidates)
}

fn sorted_by_insertion<T>(mut slots: Vec<&Slot<T>>) -> Vec<&T> {
    slots.sort_by_key(|slot| slot.seq);
    slots.into_iter().map(|slot| &slot.record).collect()
}

/// Run a task query against an unlocked record store.
#[must_use]
pub fn query_tasks(
    store: &RecordStore,
    filters: &TaskFilters,
    spec: SortSpec,
    page: PageRequest,
) -> Page<Task> {
    let needle = filter::normalized_search(filters.search.as_deref());

    let slots: Vec<&Slot<Task>> = match resolve_task_candidates(store, filters) {
        Some(ids) => ids
            .iter()
            .filter_map(|id| store.task(id))
            .filter(|slot| filters.matches_residual(&slot.record, needle.as_deref()))
            .collect(),
        None => store
            .tasks()
            .filter(|slot| filters.matches_residual(&slot.record, needle.as_deref()))
            .collect(),
    };

    let mut matches = sorted_by_insertion(slots);
    matches.sort_by(|a, b| sort::compare_tasks(a, b, spec));
    trace!(matches = matches.len(), sort = %spec.field, "Task query resolved");

    Page::from_matches(matches, page).map(Clone::clone)
}

/// Run a list query against an unlocked record store.
#[must_use]
pub fn query_lists(
    store: &RecordStore,
    filters: &ListFilters,
    spec: SortSpec,
    page: PageRequest,
) -> Page<List> {
    let needle = filter::normalized_search(filters.search.as_deref());
    let slots: Vec<&Slot<List>> = store
        .lists()
        .filter(|slot| filters.matches(&slot.record, needle.as_deref()))
        .collect();

    let mut matches = sorted_by_insertion(slots);
    matches.sort_by(|a, b| sort::compare_lists(a, b, spec));
    trace!(matches = matches.len(), sort = %spec.field, "List query resolved");

    Page::from_matches(matches, page).map(Clone::clone)
}

/// Tasks whose deadline falls on a UTC day in `[from, to]`, in insertion
/// order. Served entirely from the day-bucket index.
#[must_use]
pub fn tasks_in_deadline_range(store: &RecordStore, from: NaiveDate, to: NaiveDate) -> Vec<Task> {
    let ids = store.indexes().by_deadline_range(from, to);
    let slots: Vec<&Slot<Task>> = ids.iter().filter_map(|id| store.task(id)).collect();
    sorted_by_insertion(slots).into_iter().cloned().collect()
}
