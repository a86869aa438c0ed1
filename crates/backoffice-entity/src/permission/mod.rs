//! Permission domain entities.

pub mod input;
pub mod model;

pub use input::PermissionInput;
pub use model::{Permission, PermissionUsage};
