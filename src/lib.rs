//! `taskdeck` - In-memory indexed store for task lists
//!
//! This crate provides the data engine behind a task/list management
//! backend: keyed records, secondary indexes that stay consistent under
//! every mutation, and a filter → sort → paginate query pipeline.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`model`] - Data types (List, Task, patches, enums)
//! - [`storage`] - Record store, indexes, capacity guard, locked handle
//! - [`query`] - Filters, sorting and pagination
//! - [`snapshot`] - JSON snapshot export/import
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling
//! - [`logging`] - Tracing subscriber setup
//! - [`validation`] - Field validation for incoming data
//!
//! # Example
//!
//! ```
//! use taskdeck::model::{NewList, NewTask, Priority};
//! use taskdeck::query::{PageRequest, SortField, SortOrder, SortSpec, TaskFilters};
//! use taskdeck::{StoreConfig, TaskStore};
//!
//! let store = TaskStore::new(StoreConfig::default());
//! let list = store.create_list(NewList::named("Work")).unwrap();
//! store
//!     .create_task(NewTask::new(&list.id, "Ship it").with_priority(Priority::High))
//!     .unwrap();
//!
//! let page = store.query_tasks(
//!     &TaskFilters::in_list(&list.id),
//!     SortSpec::new(SortField::Priority, SortOrder::Desc),
//!     PageRequest::default(),
//! );
//! assert_eq!(page.total, 1);
//! assert_eq!(store.get_list(&list.id).unwrap().tasks_count, 1);
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod query;
pub mod snapshot;
pub mod storage;
pub mod validation;

pub use config::StoreConfig;
pub use error::{ErrorCode, Result, StoreError, StructuredError};
pub use storage::TaskStore;
