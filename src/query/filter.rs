//! Filter definitions and the residual (scan) predicates.

use crate::model::{List, Priority, Status, Task};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Filter options for listing tasks.
///
/// `list_id`, `status`, `priority` and the deadline bounds are answered from
/// the indexes; `search` is applied by scanning the candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilters {
    #[serde(default)]
    pub list_id: Option<String>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Inclusive lower bound on `deadline`.
    #[serde(default)]
    pub deadline_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `deadline`.
    #[serde(default)]
    pub deadline_to: Option<DateTime<Utc>>,
    /// Case-insensitive substring over title and description.
    #[serde(default)]
    pub search: Option<String>,
}

impl TaskFilters {
    #[must_use]
    pub fn in_list(list_id: impl Into<String>) -> Self {
        Self {
            list_id: Some(list_id.into()),
            ..Self::default()
        }
    }

    /// Pending tasks whose deadline is strictly before `now`.
    #[must_use]
    pub fn overdue(now: DateTime<Utc>) -> Self {
        Self {
            status: Some(Status::Pending),
            deadline_to: Some(now - Duration::nanoseconds(1)),
            ..Self::default()
        }
    }

    /// Pending tasks due within the seven days starting at `now`.
    #[must_use]
    pub fn due_this_week(now: DateTime<Utc>) -> Self {
        Self {
            status: Some(Status::Pending),
            deadline_from: Some(now),
            deadline_to: Some(now + Duration::days(7)),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn has_deadline_bounds(&self) -> bool {
        self.deadline_from.is_some() || self.deadline_to.is_some()
    }

    /// Predicates not answered by the index lookup.
    ///
    /// Deadline bounds are checked again here because the index only
    /// narrows to whole days.
    #[must_use]
    pub fn matches_residual(&self, task: &Task, needle: Option<&str>) -> bool {
        if self.has_deadline_bounds() {
            let Some(deadline) = task.deadline else {
                return false;
            };
            if self.deadline_from.is_some_and(|from| deadline < from) {
                return false;
            }
            if self.deadline_to.is_some_and(|to| deadline > to) {
                return false;
            }
        }
        needle.is_none_or(|needle| {
            contains_folded(&task.title, needle)
                || task
                    .description
                    .as_deref()
                    .is_some_and(|d| contains_folded(d, needle))
        })
    }

    /// Full predicate, used when no index narrowed the candidates.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        let needle = normalized_search(self.search.as_deref());
        self.list_id.as_ref().is_none_or(|id| *id == task.list_id)
            && self.status.is_none_or(|s| s == task.status)
            && self.priority.is_none_or(|p| p == task.priority)
            && self.matches_residual(task, needle.as_deref())
    }
}

/// Filter options for listing lists. Lists have no secondary indexes, so
/// every predicate is a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilters {
    #[serde(default)]
    pub color: Option<String>,
    /// Case-insensitive substring over name and description.
    #[serde(default)]
    pub search: Option<String>,
}

impl ListFilters {
    #[must_use]
    pub fn matches(&self, list: &List, needle: Option<&str>) -> bool {
        if let Some(color) = &self.color {
            if !list
                .color
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(color))
            {
                return false;
            }
        }
        needle.is_none_or(|needle| {
            contains_folded(&list.name, needle)
                || list
                    .description
                    .as_deref()
                    .is_some_and(|d| contains_folded(d, needle))
        })
    }
}

/// Lower-case a search term; blank terms mean "no search".
#[must_use]
pub fn normalized_search(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

/// `needle` must already be lower-case.
fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
