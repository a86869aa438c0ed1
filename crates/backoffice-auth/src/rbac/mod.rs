//! Permission gate for the management areas.

pub mod enforcer;
pub mod permission;

pub use enforcer::RbacEnforcer;
pub use permission::SystemPermission;
