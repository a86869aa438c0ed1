//! Core type definitions used across the backoffice workspace.

pub mod id;
pub mod notification;
pub mod pagination;
pub mod query;

pub use id::*;
pub use notification::{Notification, NotificationKind};
pub use pagination::{PageRequest, PageResponse};
pub use query::ListQuery;
