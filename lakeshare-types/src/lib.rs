//! Core types for lakeshare.
//!
//! This crate defines the domain model shared by every other crate:
//! - Strongly-typed identifiers (`ShareUri`, `DatasetUri`, ...)
//! - Share and share-item lifecycle statuses and actions
//! - Producer-side resources (datasets, tables, storage locations)
//! - Consumer-side environments and teams
//! - Persisted tasks consumed by workers

mod error;
mod ids;
mod model;
mod status;
mod task;

pub use error::ParseError;
pub use ids::{
    DatasetUri, EnvironmentUri, GroupUri, LocationUri, ShareItemUri, ShareUri, TableUri, TaskUri,
};
pub use model::{
    Dataset, DatasetStorageLocation, DatasetTable, Environment, EnvironmentGroup, ShareData,
    ShareItems, ShareObject, ShareObjectItem, ShareableItem,
};
pub use status::{
    PrincipalType, ShareItemAction, ShareItemStatus, ShareObjectAction, ShareObjectStatus,
    ShareableType,
};
pub use task::{Task, TaskStatus};
