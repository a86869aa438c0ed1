//! Protected-entity policy.

pub mod protected;

pub use protected::{
    CORE_PERMISSIONS, DeletionTarget, DenyReason, PolicyDecision, ProtectedEntityPolicy,
    SUPER_ADMIN_ROLE,
};
