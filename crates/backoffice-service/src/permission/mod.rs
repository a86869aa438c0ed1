//! Permission management.

pub mod service;

pub use service::PermissionService;
