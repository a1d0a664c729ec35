//! Sort specifications and comparators.
//!
//! All sorts are stable and run over candidates already ordered by
//! insertion sequence, so equal keys keep insertion order in both
//! directions.

use crate::error::{Result, StoreError};
use crate::model::{List, Task};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortOrder {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            other => Err(StoreError::validation(
                "order",
                format!("unknown sort order '{other}', expected asc or desc"),
            )),
        }
    }
}

/// Sortable fields. `Name` sorts lists by name and tasks by title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    #[serde(alias = "title")]
    Name,
    Deadline,
    Priority,
    Status,
}

impl SortField {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Name => "name",
            Self::Deadline => "deadline",
            Self::Priority => "priority",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "created_at" | "createdat" => Ok(Self::CreatedAt),
            "updated_at" | "updatedat" => Ok(Self::UpdatedAt),
            "name" | "title" => Ok(Self::Name),
            "deadline" => Ok(Self::Deadline),
            "priority" => Ok(Self::Priority),
            "status" => Ok(Self::Status),
            other => Err(StoreError::validation(
                "sort",
                format!("unknown sort field '{other}'"),
            )),
        }
    }
}

/// Which field to sort by, and in which direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortSpec {
    #[serde(default)]
    pub field: SortField,
    #[serde(default)]
    pub order: SortOrder,
}

impl SortSpec {
    #[must_use]
    pub const fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    /// Default for deadline-oriented queries (overdue, due soon).
    #[must_use]
    pub const fn deadline_asc() -> Self {
        Self::new(SortField::Deadline, SortOrder::Asc)
    }
}

/// Deadlines compare in `order`, but tasks without one always come last.
fn compare_deadlines(a: &Task, b: &Task, order: SortOrder) -> Ordering {
    match (a.deadline, b.deadline) {
        (Some(x), Some(y)) => order.apply(x.cmp(&y)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

#[must_use]
pub fn compare_tasks(a: &Task, b: &Task, spec: SortSpec) -> Ordering {
    let ordering = match spec.field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Name => compare_text(&a.title, &b.title),
        SortField::Priority => a.priority.rank().cmp(&b.priority.rank()),
        SortField::Status => a.status.cmp(&b.status),
        SortField::Deadline => return compare_deadlines(a, b, spec.order),
    };
    spec.order.apply(ordering)
}

/// Lists have no deadline, priority or status; those fields sort by
/// creation time.
#[must_use]
pub fn compare_lists(a: &List, b: &List, spec: SortSpec) -> Ordering {
    let ordering = match spec.field {
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Name => compare_text(&a.name, &b.name),
        SortField::CreatedAt | SortField::Deadline | SortField::Priority | SortField::Status => {
            a.created_at.cmp(&b.created_at)
        }
    };
    spec.order.apply(ordering)
}
