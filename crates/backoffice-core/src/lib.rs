//! # backoffice-core
//!
//! Core crate for the backoffice. Contains configuration schemas, typed
//! identifiers, pagination/list-query/notification types, authentication
//! domain events, and the unified error system.
//!
//! This crate has **no** internal dependencies on other backoffice crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
