//! Fixtures shared by the service tests.

use std::sync::Arc;

use backoffice_auth::{CredentialHasher, PasswordHasher, RbacEnforcer, SystemPermission};
use backoffice_core::error::AppError;
use backoffice_core::types::id::UserId;
use backoffice_database::{MemoryStore, PermissionStore, RoleStore, UserStore};
use backoffice_entity::permission::{Permission, PermissionInput};
use backoffice_entity::role::{RoleInput, RoleWithPermissions};
use backoffice_entity::user::{CreateUser, UserWithRoles};

use crate::audit::AuditLogger;
use crate::context::RequestContext;

pub(crate) fn admin_ctx() -> RequestContext {
    ctx_with(UserId::new(), SystemPermission::ALL.iter().map(|p| p.name().to_string()).collect())
}

pub(crate) fn ctx_with(user_id: UserId, permissions: Vec<String>) -> RequestContext {
    RequestContext::new(user_id, "admin@mail.com", permissions)
}

pub(crate) fn audit(store: &MemoryStore) -> AuditLogger {
    AuditLogger::new(Arc::new(store.clone()))
}

pub(crate) fn rbac() -> Arc<RbacEnforcer> {
    Arc::new(RbacEnforcer::new())
}

pub(crate) fn hasher() -> Arc<PasswordHasher> {
    Arc::new(PasswordHasher::new())
}

/// A hasher whose backend always errors.
#[derive(Debug)]
pub(crate) struct BrokenHasher;

impl CredentialHasher for BrokenHasher {
    fn hash_password(&self, _password: &str) -> Result<String, AppError> {
        Err(AppError::internal("Password hashing failed: out of memory"))
    }
}

pub(crate) async fn permission(store: &MemoryStore, name: &str) -> Permission {
    store
        .create_permission(&PermissionInput { name: name.into() })
        .await
        .expect("create permission")
}

pub(crate) async fn role(store: &MemoryStore, name: &str, permissions: &[&Permission]) -> RoleWithPermissions {
    store
        .create_role(&RoleInput {
            name: name.into(),
            permission_ids: permissions.iter().map(|p| p.id).collect(),
        })
        .await
        .expect("create role")
}

pub(crate) async fn user(store: &MemoryStore, name: &str, email: &str) -> UserWithRoles {
    store
        .create_user(&CreateUser {
            name: name.into(),
            email: email.into(),
            password_hash: "$argon2id$placeholder".into(),
            role_ids: Vec::new(),
        })
        .await
        .expect("create user")
}
