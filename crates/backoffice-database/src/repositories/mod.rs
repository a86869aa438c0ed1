//! PostgreSQL implementations of the store traits.

pub mod activity;
pub mod audit;
pub mod meta_tag;
pub mod permission;
pub mod role;
pub mod user;

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use backoffice_core::error::{AppError, ErrorKind};

pub use activity::ActivityRepository;
pub use audit::AuditLogRepository;
pub use meta_tag::MetaTagRepository;
pub use permission::PermissionRepository;
pub use role::RoleRepository;
pub use user::UserRepository;

/// Every Postgres repository sharing one pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    /// Users and their role assignments.
    pub users: Arc<UserRepository>,
    /// Roles and their permission grants.
    pub roles: Arc<RoleRepository>,
    /// Permissions.
    pub permissions: Arc<PermissionRepository>,
    /// Page meta tags.
    pub meta_tags: Arc<MetaTagRepository>,
    /// Login/logout activity.
    pub activities: Arc<ActivityRepository>,
    /// Audit trail.
    pub audit: Arc<AuditLogRepository>,
}

impl PgStore {
    /// Build every repository over `pool`.
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            roles: Arc::new(RoleRepository::new(pool.clone())),
            permissions: Arc::new(PermissionRepository::new(pool.clone())),
            meta_tags: Arc::new(MetaTagRepository::new(pool.clone())),
            activities: Arc::new(ActivityRepository::new(pool.clone())),
            audit: Arc::new(AuditLogRepository::new(pool)),
        }
    }
}

/// Map a unique-constraint violation on `constraint` to a conflict and
/// anything else to a database error.
pub(crate) fn unique_violation(
    err: sqlx::Error,
    constraint: &str,
    conflict_message: impl Into<String>,
    context: &str,
) -> AppError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.constraint() == Some(constraint) => {
            AppError::conflict(conflict_message)
        }
        other => AppError::with_source(ErrorKind::Database, context.to_string(), other),
    }
}

/// Convert typed ids into raw UUIDs for array binds.
pub(crate) fn raw_ids<T: Copy + Into<Uuid>>(ids: &[T]) -> Vec<Uuid> {
    ids.iter().map(|id| (*id).into()).collect()
}
