//! User entity model.

use backoffice_core::types::id::{RoleId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A backoffice account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address, unique case-insensitively.
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A user together with the roles it holds, as shown on the edit form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserWithRoles {
    /// The user row.
    #[serde(flatten)]
    pub user: User,
    /// Ids of the held roles.
    pub role_ids: Vec<RoleId>,
    /// Names of the held roles, sorted.
    pub role_names: Vec<String>,
}

impl UserWithRoles {
    /// Whether the user holds a role with the given name.
    pub fn has_role(&self, name: &str) -> bool {
        self.role_names.iter().any(|r| r == name)
    }
}

/// Data required to insert a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Argon2 password hash.
    pub password_hash: String,
    /// Roles to attach.
    pub role_ids: Vec<RoleId>,
}

/// Data for updating a user. `password_hash` is `None` when the
/// credential stays unchanged.
#[derive(Debug, Clone)]
pub struct UpdateUser {
    /// New display name.
    pub name: String,
    /// New email address.
    pub email: String,
    /// New Argon2 password hash.
    pub password_hash: Option<String>,
    /// Exact role set after the update.
    pub role_ids: Vec<RoleId>,
}
