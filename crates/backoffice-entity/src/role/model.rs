//! Role entity model.

use backoffice_core::types::id::{PermissionId, RoleId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A named bundle of permissions assignable to users.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    /// Unique role identifier.
    pub id: RoleId,
    /// Unique role name.
    pub name: String,
    /// When the role was created.
    pub created_at: DateTime<Utc>,
    /// When the role was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A role together with its granted permissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleWithPermissions {
    /// The role row.
    #[serde(flatten)]
    pub role: Role,
    /// Ids of the granted permissions.
    pub permission_ids: Vec<PermissionId>,
    /// Names of the granted permissions, sorted.
    pub permission_names: Vec<String>,
}

/// Role name with the number of users holding it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoleUsage {
    /// Role identifier.
    pub id: RoleId,
    /// Role name.
    pub name: String,
    /// Number of users holding the role.
    pub users_count: i64,
}
