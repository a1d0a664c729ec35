//! Field validation for incoming list and task data.
//!
//! Runs before the store touches any record or index, so a rejected call
//! never leaves partial state behind.

use crate::error::{Result, StoreError};
use crate::model::{List, ListPatch, NewList, NewTask, Task, TaskPatch};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 1000;

fn require_text(field: &str, value: &str, max: usize) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::validation(field, "must not be empty"));
    }
    if trimmed.chars().count() > max {
        return Err(StoreError::validation(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(())
}

fn check_description(value: Option<&str>) -> Result<()> {
    match value {
        Some(text) if text.chars().count() > MAX_DESCRIPTION_LEN => Err(StoreError::validation(
            "description",
            format!("must be at most {MAX_DESCRIPTION_LEN} characters"),
        )),
        _ => Ok(()),
    }
}

/// Colors are `#RRGGBB` hex strings.
fn check_color(value: Option<&str>) -> Result<()> {
    let Some(color) = value else {
        return Ok(());
    };
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err(StoreError::validation(
            "color",
            format!("'{color}' is not a #RRGGBB hex color"),
        ))
    }
}

/// Validate a list creation request.
///
/// # Errors
///
/// Returns `Validation` if any field is out of bounds.
pub fn validate_new_list(new: &NewList) -> Result<()> {
    check_list_fields(&new.name, new.description.as_deref(), new.color.as_deref())
}

/// Validate a stored list, as read back from a snapshot.
///
/// # Errors
///
/// Returns `Validation` if any field is out of bounds.
pub fn validate_list_record(list: &List) -> Result<()> {
    check_list_fields(&list.name, list.description.as_deref(), list.color.as_deref())
}

fn check_list_fields(name: &str, description: Option<&str>, color: Option<&str>) -> Result<()> {
    require_text("name", name, MAX_NAME_LEN)?;
    check_description(description)?;
    check_color(color)
}

/// Validate a list patch.
///
/// # Errors
///
/// Returns `Validation` if any provided field is out of bounds.
pub fn validate_list_patch(patch: &ListPatch) -> Result<()> {
    if let Some(name) = &patch.name {
        require_text("name", name, MAX_NAME_LEN)?;
    }
    if let Some(description) = &patch.description {
        check_description(description.as_deref())?;
    }
    if let Some(color) = &patch.color {
        check_color(color.as_deref())?;
    }
    Ok(())
}

/// Validate a task creation request.
///
/// # Errors
///
/// Returns `Validation` if any field is out of bounds.
pub fn validate_new_task(new: &NewTask) -> Result<()> {
    check_task_fields(&new.list_id, &new.title, new.description.as_deref())
}

/// Validate a stored task, as read back from a snapshot.
///
/// # Errors
///
/// Returns `Validation` if any field is out of bounds.
pub fn validate_task_record(task: &Task) -> Result<()> {
    check_task_fields(&task.list_id, &task.title, task.description.as_deref())
}

fn check_task_fields(list_id: &str, title: &str, description: Option<&str>) -> Result<()> {
    if list_id.trim().is_empty() {
        return Err(StoreError::validation("list_id", "must not be empty"));
    }
    require_text("title", title, MAX_TITLE_LEN)?;
    check_description(description)
}

/// Validate a task patch.
///
/// # Errors
///
/// Returns `Validation` if any provided field is out of bounds.
pub fn validate_task_patch(patch: &TaskPatch) -> Result<()> {
    if let Some(list_id) = &patch.list_id {
        if list_id.trim().is_empty() {
            return Err(StoreError::validation("list_id", "must not be empty"));
        }
    }
    if let Some(title) = &patch.title {
        require_text("title", title, MAX_TITLE_LEN)?;
    }
    if let Some(description) = &patch.description {
        check_description(description.as_deref())?;
    }
    Ok(())
}
