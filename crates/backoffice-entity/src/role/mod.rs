//! Role domain entities.

pub mod input;
pub mod model;

pub use input::RoleInput;
pub use model::{Role, RoleUsage, RoleWithPermissions};
