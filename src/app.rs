//! Wiring: one Postgres pool, the stores over it, and the services built
//! from them.

use std::sync::Arc;

use sqlx::PgPool;

use backoffice_auth::{PasswordHasher, RbacEnforcer};
use backoffice_core::config::AppConfig;
use backoffice_core::error::AppError;
use backoffice_core::result::AppResult;
use backoffice_database::{DatabasePool, PgStore, UserStore};
use backoffice_service::{
    ActivityRecorder, AdminUserService, AuditLogger, AuditService, MetaTagResolver,
    MetaTagService, OverviewService, PermissionService, RequestContext, RoleService, Seeder,
};

/// Everything a command needs, built once per invocation.
pub struct App {
    config: AppConfig,
    pool: DatabasePool,
    store: PgStore,
    hasher: Arc<PasswordHasher>,
    rbac: Arc<RbacEnforcer>,
    audit: AuditLogger,
}

impl App {
    /// Connect to the database and build the stores.
    pub async fn connect(config: AppConfig) -> AppResult<Self> {
        let pool = DatabasePool::connect(&config.database).await?;
        let store = PgStore::new(pool.pool().clone());
        let audit = AuditLogger::new(store.audit.clone());

        Ok(Self {
            config,
            pool,
            store,
            hasher: Arc::new(PasswordHasher::new()),
            rbac: Arc::new(RbacEnforcer::new()),
            audit,
        })
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        self.pool.pool()
    }

    /// Build the request context for the administrator with `email`.
    pub async fn actor(&self, email: Option<&str>) -> AppResult<RequestContext> {
        let email = email.ok_or_else(|| {
            AppError::authorization("This command requires --actor <email> of an administrator")
        })?;
        let user = self
            .store
            .users
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| AppError::authorization(format!("Unknown actor '{email}'")))?;
        let permissions = self.store.users.permission_names_for(user.id).await?;

        tracing::debug!(actor = %user.id, permissions = ?permissions, "Resolved acting user");
        Ok(RequestContext::new(user.id, user.email, permissions).with_client(
            None,
            Some(format!("backoffice-cli/{}", env!("CARGO_PKG_VERSION"))),
        ))
    }

    pub fn users(&self) -> AdminUserService {
        AdminUserService::new(
            self.store.users.clone(),
            self.store.roles.clone(),
            self.hasher.clone(),
            Arc::clone(&self.rbac),
            self.audit.clone(),
            self.config.admin.page_size,
        )
    }

    pub fn roles(&self) -> RoleService {
        RoleService::new(
            self.store.roles.clone(),
            self.store.permissions.clone(),
            Arc::clone(&self.rbac),
            self.audit.clone(),
            self.config.admin.page_size,
        )
    }

    pub fn permissions(&self) -> PermissionService {
        PermissionService::new(
            self.store.permissions.clone(),
            Arc::clone(&self.rbac),
            self.audit.clone(),
            self.config.admin.page_size,
        )
    }

    pub fn meta_tags(&self) -> MetaTagService {
        MetaTagService::new(
            self.store.meta_tags.clone(),
            self.audit.clone(),
            self.config.admin.page_size,
        )
    }

    pub fn resolver(&self) -> MetaTagResolver {
        MetaTagResolver::new(self.store.meta_tags.clone())
    }

    pub fn overview(&self) -> OverviewService {
        OverviewService::new(
            self.store.users.clone(),
            self.store.roles.clone(),
            self.store.permissions.clone(),
            self.config.admin.overview_limit,
        )
    }

    pub fn audit_trail(&self) -> AuditService {
        AuditService::new(self.store.audit.clone(), Arc::clone(&self.rbac))
    }

    pub fn seeder(&self) -> Seeder {
        Seeder::new(
            self.store.users.clone(),
            self.store.roles.clone(),
            self.store.permissions.clone(),
            self.store.meta_tags.clone(),
            Arc::clone(&self.hasher),
            self.audit.clone(),
        )
    }

    /// Start the activity recorder's consumer task.
    pub fn activity_recorder(&self) -> ActivityRecorder {
        ActivityRecorder::start(
            self.store.activities.clone(),
            Arc::clone(&self.rbac),
            &self.config.activity,
        )
    }

    /// Close the pool.
    pub async fn close(self) {
        self.pool.close().await;
    }
}
