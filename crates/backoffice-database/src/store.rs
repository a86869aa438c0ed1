//! Store traits the admin services write through.
//!
//! Every write method is one unit of work: the row mutation and the
//! association sync it implies either commit together or leave storage
//! untouched. Two implementations exist: [`crate::PgStore`] backed by
//! PostgreSQL and [`crate::MemoryStore`] guarded by a `tokio::sync::Mutex`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use backoffice_core::result::AppResult;
use backoffice_core::types::id::{MetaTagId, PermissionId, RoleId, UserId};
use backoffice_core::types::pagination::PageResponse;
use backoffice_core::types::query::ListQuery;
use backoffice_entity::activity::{CreateUserActivity, UserActivity};
use backoffice_entity::audit::{AuditLogEntry, AuditQuery, CreateAuditLogEntry};
use backoffice_entity::meta_tag::{MetaTag, MetaTagInput};
use backoffice_entity::permission::{Permission, PermissionInput, PermissionUsage};
use backoffice_entity::role::{Role, RoleInput, RoleUsage, RoleWithPermissions};
use backoffice_entity::user::{CreateUser, UpdateUser, User, UserWithRoles};

/// Persistence for user accounts and their role assignments.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Find a user by id.
    async fn find_user(&self, id: UserId) -> AppResult<Option<User>>;

    /// Find a user with its roles.
    async fn find_user_with_roles(&self, id: UserId) -> AppResult<Option<UserWithRoles>>;

    /// Find a user by email, ignoring case.
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Search name and email, newest first.
    async fn search_users(&self, query: &ListQuery) -> AppResult<PageResponse<UserWithRoles>>;

    /// Insert a user and attach its roles.
    async fn create_user(&self, data: &CreateUser) -> AppResult<UserWithRoles>;

    /// Update a user and replace its role set.
    async fn update_user(&self, id: UserId, data: &UpdateUser) -> AppResult<UserWithRoles>;

    /// Delete a user, detaching its roles.
    async fn delete_user(&self, id: UserId) -> AppResult<()>;

    /// Names of every permission granted to the user through its roles.
    async fn permission_names_for(&self, id: UserId) -> AppResult<Vec<String>>;

    /// Total number of users.
    async fn count_users(&self) -> AppResult<u64>;

    /// The most recently created users.
    async fn latest_users(&self, limit: u64) -> AppResult<Vec<User>>;
}

/// Persistence for roles and their permission grants.
#[async_trait]
pub trait RoleStore: Send + Sync + 'static {
    /// Find a role by id.
    async fn find_role(&self, id: RoleId) -> AppResult<Option<Role>>;

    /// Find a role with its permissions.
    async fn find_role_with_permissions(&self, id: RoleId)
    -> AppResult<Option<RoleWithPermissions>>;

    /// Find a role by exact name.
    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>>;

    /// Search role names, newest first.
    async fn search_roles(&self, query: &ListQuery) -> AppResult<PageResponse<RoleWithPermissions>>;

    /// Every role, ordered by name.
    async fn all_roles(&self) -> AppResult<Vec<Role>>;

    /// Insert a role and grant its permissions.
    async fn create_role(&self, input: &RoleInput) -> AppResult<RoleWithPermissions>;

    /// Rename a role and replace its permission set.
    async fn update_role(&self, id: RoleId, input: &RoleInput) -> AppResult<RoleWithPermissions>;

    /// Delete a role, detaching its permissions and users.
    async fn delete_role(&self, id: RoleId) -> AppResult<()>;

    /// Total number of roles.
    async fn count_roles(&self) -> AppResult<u64>;

    /// Roles ordered by how many users hold them.
    async fn top_roles(&self, limit: u64) -> AppResult<Vec<RoleUsage>>;
}

/// Persistence for permissions.
#[async_trait]
pub trait PermissionStore: Send + Sync + 'static {
    /// Find a permission by id.
    async fn find_permission(&self, id: PermissionId) -> AppResult<Option<Permission>>;

    /// Find a permission by exact name.
    async fn find_permission_by_name(&self, name: &str) -> AppResult<Option<Permission>>;

    /// Search permission names, newest first.
    async fn search_permissions(&self, query: &ListQuery) -> AppResult<PageResponse<Permission>>;

    /// Every permission, ordered by name.
    async fn all_permissions(&self) -> AppResult<Vec<Permission>>;

    /// Insert a permission.
    async fn create_permission(&self, input: &PermissionInput) -> AppResult<Permission>;

    /// Rename a permission.
    async fn update_permission(
        &self,
        id: PermissionId,
        input: &PermissionInput,
    ) -> AppResult<Permission>;

    /// Delete a permission, detaching it from every role.
    async fn delete_permission(&self, id: PermissionId) -> AppResult<()>;

    /// Total number of permissions.
    async fn count_permissions(&self) -> AppResult<u64>;

    /// Permissions ordered by how many roles grant them.
    async fn top_permissions(&self, limit: u64) -> AppResult<Vec<PermissionUsage>>;
}

/// Persistence for page meta tags.
#[async_trait]
pub trait MetaTagStore: Send + Sync + 'static {
    /// Find a meta tag by id.
    async fn find_meta_tag(&self, id: MetaTagId) -> AppResult<Option<MetaTag>>;

    /// Find the meta tag keyed by `page`.
    async fn find_meta_tag_by_page(&self, page: &str) -> AppResult<Option<MetaTag>>;

    /// Search page keys and titles, newest first.
    async fn search_meta_tags(&self, query: &ListQuery) -> AppResult<PageResponse<MetaTag>>;

    /// Insert a meta tag, applying the `og_type`/`twitter_card` defaults.
    async fn create_meta_tag(&self, input: &MetaTagInput) -> AppResult<MetaTag>;

    /// Overwrite every field of a meta tag.
    async fn update_meta_tag(&self, id: MetaTagId, input: &MetaTagInput) -> AppResult<MetaTag>;

    /// Delete a meta tag.
    async fn delete_meta_tag(&self, id: MetaTagId) -> AppResult<()>;
}

/// Append-only login/logout activity.
#[async_trait]
pub trait ActivityStore: Send + Sync + 'static {
    /// Append one activity row.
    async fn append_activity(&self, data: &CreateUserActivity) -> AppResult<UserActivity>;

    /// Delete activity rows created before `before`, or all rows when
    /// `before` is `None`. Returns the number of deleted rows.
    async fn purge_activities(&self, before: Option<DateTime<Utc>>) -> AppResult<u64>;
}

/// Append-only audit trail.
#[async_trait]
pub trait AuditStore: Send + Sync + 'static {
    /// Append one audit entry.
    async fn append_audit(&self, data: &CreateAuditLogEntry) -> AppResult<AuditLogEntry>;

    /// Filtered audit listing, newest first.
    async fn search_audit(&self, query: &AuditQuery) -> AppResult<PageResponse<AuditLogEntry>>;
}
