//! Permission entity model.

use backoffice_core::types::id::PermissionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A named capability granted to roles.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Permission {
    /// Unique permission identifier.
    pub id: PermissionId,
    /// Unique permission name, e.g. `"manage users"`.
    pub name: String,
    /// When the permission was created.
    pub created_at: DateTime<Utc>,
    /// When the permission was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Permission name with the number of roles granting it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PermissionUsage {
    /// Permission identifier.
    pub id: PermissionId,
    /// Permission name.
    pub name: String,
    /// Number of roles granting the permission.
    pub roles_count: i64,
}
