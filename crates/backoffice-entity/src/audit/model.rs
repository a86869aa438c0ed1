//! Audit log entry entity model.

use backoffice_core::types::id::{AuditLogId, UserId};
use backoffice_core::types::pagination::PageRequest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::outcome::AuditOutcome;

/// An immutable record of one administrative action.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLogEntry {
    /// Unique audit entry identifier.
    pub id: AuditLogId,
    /// The administrator who acted; `None` for system actions such as seeding.
    pub actor_id: Option<UserId>,
    /// The action, e.g. `"role.delete"`.
    pub action: String,
    /// The target entity type, e.g. `"role"`.
    pub target_type: String,
    /// The target entity id, when one exists.
    pub target_id: Option<Uuid>,
    /// How the action ended.
    pub outcome: AuditOutcome,
    /// Before/after state, rejection reason or failure detail.
    pub details: Option<serde_json::Value>,
    /// IP address of the actor.
    pub ip_address: Option<String>,
    /// User-Agent of the actor.
    pub user_agent: Option<String>,
    /// When the action occurred.
    pub created_at: DateTime<Utc>,
}

/// Data required to append an audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditLogEntry {
    /// The administrator who acted.
    pub actor_id: Option<UserId>,
    /// The action performed.
    pub action: String,
    /// Target entity type.
    pub target_type: String,
    /// Target entity id.
    pub target_id: Option<Uuid>,
    /// How the action ended.
    pub outcome: AuditOutcome,
    /// Additional details.
    pub details: Option<serde_json::Value>,
    /// Actor's IP address.
    pub ip_address: Option<String>,
    /// Actor's User-Agent.
    pub user_agent: Option<String>,
}

/// Filters for the audit trail listing. Unset filters match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditQuery {
    /// Only entries by this actor.
    #[serde(default)]
    pub actor_id: Option<UserId>,
    /// Only entries on this target type.
    #[serde(default)]
    pub target_type: Option<String>,
    /// Only entries with this action.
    #[serde(default)]
    pub action: Option<String>,
    /// Requested page.
    #[serde(default)]
    pub page: PageRequest,
}

impl AuditQuery {
    /// Whether an entry passes every set filter.
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        self.actor_id.is_none_or(|actor| entry.actor_id == Some(actor))
            && self
                .target_type
                .as_deref()
                .is_none_or(|t| entry.target_type == t)
            && self.action.as_deref().is_none_or(|a| entry.action == a)
    }
}
