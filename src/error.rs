//! Error types for `taskdeck`.
//!
//! The store reports failures through a closed taxonomy ([`StoreError`]).
//! Callers at the HTTP boundary translate them with [`ErrorCode`] and
//! [`StructuredError`]; the store itself knows nothing about transports.

use serde::Serialize;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Which kind of record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    List,
    Task,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Task => write!(f, "task"),
        }
    }
}

/// Errors surfaced by the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: String },

    #[error("store capacity exceeded: {current} records, maximum is {max}")]
    CapacityExceeded { max: usize, current: usize },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("invalid state: {message}")]
    InvalidState { message: String },

    #[error("validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl StoreError {
    pub fn list_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: EntityKind::List,
            id: id.into(),
        }
    }

    pub fn task_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: EntityKind::Task,
            id: id.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::CapacityExceeded { .. } => ErrorCode::CapacityExceeded,
            Self::Conflict { .. } => ErrorCode::Conflict,
            Self::InvalidState { .. } => ErrorCode::InvalidState,
            Self::Validation { .. } => ErrorCode::ValidationFailed,
            Self::Config(_) | Self::Yaml(_) => ErrorCode::ConfigError,
            Self::Snapshot(_) | Self::Json(_) => ErrorCode::SnapshotError,
            Self::Io(_) => ErrorCode::IoError,
        }
    }
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    CapacityExceeded,
    Conflict,
    InvalidState,
    ValidationFailed,
    ConfigError,
    SnapshotError,
    IoError,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::CapacityExceeded => "CAPACITY_EXCEEDED",
            Self::Conflict => "CONFLICT",
            Self::InvalidState => "INVALID_STATE",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::SnapshotError => "SNAPSHOT_ERROR",
            Self::IoError => "IO_ERROR",
        }
    }

    /// Suggested HTTP status for the transport layer.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::InvalidState | Self::ValidationFailed => 400,
            Self::CapacityExceeded => 507,
            Self::ConfigError | Self::SnapshotError | Self::IoError => 500,
        }
    }

    /// Whether retrying the same call might succeed later without changes.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::CapacityExceeded | Self::IoError)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializable error payload for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct StructuredError {
    pub code: ErrorCode,
    pub message: String,
    pub retryable: bool,
}

impl From<&StoreError> for StructuredError {
    fn from(err: &StoreError) -> Self {
        let code = err.code();
        Self {
            code,
            message: err.to_string(),
            retryable: code.is_retryable(),
        }
    }
}
