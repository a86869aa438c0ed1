//! User activity entity model.

use backoffice_core::events::AuthEvent;
use backoffice_core::types::id::{ActivityId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::kind::ActivityType;

/// An append-only login/logout record.
///
/// `user_id` is a weak reference: rows outlive the user they belong to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserActivity {
    /// Unique row identifier.
    pub id: ActivityId,
    /// The user the activity belongs to.
    pub user_id: UserId,
    /// Login or logout.
    pub activity_type: ActivityType,
    /// Client IP address.
    pub ip_address: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
    /// When the activity happened.
    pub created_at: DateTime<Utc>,
}

/// Data required to append an activity row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserActivity {
    /// The user the activity belongs to.
    pub user_id: UserId,
    /// Login or logout.
    pub activity_type: ActivityType,
    /// Client IP address.
    pub ip_address: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
    /// When the activity happened.
    pub occurred_at: DateTime<Utc>,
}

impl From<AuthEvent> for CreateUserActivity {
    fn from(event: AuthEvent) -> Self {
        match event {
            AuthEvent::Login {
                user_id,
                ip_address,
                user_agent,
                at,
            } => Self {
                user_id,
                activity_type: ActivityType::Login,
                ip_address,
                user_agent,
                occurred_at: at,
            },
            AuthEvent::Logout {
                user_id,
                ip_address,
                user_agent,
                at,
            } => Self {
                user_id,
                activity_type: ActivityType::Logout,
                ip_address,
                user_agent,
                occurred_at: at,
            },
        }
    }
}
