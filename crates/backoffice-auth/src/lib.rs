//! # backoffice-auth
//!
//! Authorization rules for the backoffice.
//!
//! ## Modules
//!
//! - `password`: Argon2id password hashing and verification
//! - `policy`: the protected-entity policy consulted before destructive or
//!   renaming writes
//! - `rbac`: permission gate for the management areas

pub mod password;
pub mod policy;
pub mod rbac;

pub use password::{CredentialHasher, PasswordHasher};
pub use policy::{DeletionTarget, DenyReason, PolicyDecision, ProtectedEntityPolicy};
pub use rbac::{RbacEnforcer, SystemPermission};
