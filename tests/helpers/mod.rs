//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use backoffice_auth::{PasswordHasher, RbacEnforcer};
use backoffice_core::types::id::UserId;
use backoffice_database::{MemoryStore, UserStore};
use backoffice_service::{
    AdminUserService, AuditLogger, AuditService, MetaTagResolver, MetaTagService,
    PermissionService, RequestContext, RoleService, Seeder,
};

/// Seeded accounts share this password.
pub const SEED_PASSWORD: &str = "password123";

/// Services wired over a single in-memory store
pub struct TestApp {
    /// The backing store, for direct inspection
    pub store: MemoryStore,
    hasher: Arc<PasswordHasher>,
    rbac: Arc<RbacEnforcer>,
}

impl TestApp {
    /// Create an empty application
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new(),
            hasher: Arc::new(PasswordHasher::new()),
            rbac: Arc::new(RbacEnforcer::new()),
        }
    }

    /// Create an application holding the seed data
    pub async fn seeded() -> Self {
        let app = Self::new();
        app.seeder()
            .run(SEED_PASSWORD)
            .await
            .expect("Failed to seed");
        app
    }

    fn audit(&self) -> AuditLogger {
        AuditLogger::new(Arc::new(self.store.clone()))
    }

    pub fn users(&self) -> AdminUserService {
        AdminUserService::new(
            Arc::new(self.store.clone()),
            Arc::new(self.store.clone()),
            self.hasher.clone(),
            Arc::clone(&self.rbac),
            self.audit(),
            10,
        )
    }

    pub fn roles(&self) -> RoleService {
        RoleService::new(
            Arc::new(self.store.clone()),
            Arc::new(self.store.clone()),
            Arc::clone(&self.rbac),
            self.audit(),
            10,
        )
    }

    pub fn permissions(&self) -> PermissionService {
        PermissionService::new(
            Arc::new(self.store.clone()),
            Arc::clone(&self.rbac),
            self.audit(),
            10,
        )
    }

    pub fn meta_tags(&self) -> MetaTagService {
        MetaTagService::new(Arc::new(self.store.clone()), self.audit(), 10)
    }

    pub fn resolver(&self) -> MetaTagResolver {
        MetaTagResolver::new(Arc::new(self.store.clone()))
    }

    pub fn audit_trail(&self) -> AuditService {
        AuditService::new(Arc::new(self.store.clone()), Arc::clone(&self.rbac))
    }

    pub fn seeder(&self) -> Seeder {
        Seeder::new(
            Arc::new(self.store.clone()),
            Arc::new(self.store.clone()),
            Arc::new(self.store.clone()),
            Arc::new(self.store.clone()),
            Arc::clone(&self.hasher),
            self.audit(),
        )
    }

    /// Request context for the user with `email`, holding the
    /// permissions granted through their roles.
    pub async fn login(&self, email: &str) -> RequestContext {
        let user = self
            .store
            .find_user_by_email(email)
            .await
            .expect("Failed to look up user")
            .unwrap_or_else(|| panic!("No user with email {email}"));
        self.context_for(user.id, &user.email).await
    }

    /// Request context for an arbitrary user id.
    pub async fn context_for(&self, id: UserId, email: &str) -> RequestContext {
        let permissions = self
            .store
            .permission_names_for(id)
            .await
            .expect("Failed to load permissions");
        RequestContext::new(id, email, permissions)
            .with_client(Some("127.0.0.1".into()), Some("integration-test".into()))
    }
}
