//! Appends one audit entry per admin write attempt.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::error;
use uuid::Uuid;

use backoffice_database::AuditStore;
use backoffice_entity::audit::{AuditOutcome, CreateAuditLogEntry};

use crate::context::RequestContext;

/// Entity kind an audited action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditTarget {
    /// A user account.
    User,
    /// A role.
    Role,
    /// A permission.
    Permission,
    /// A page meta tag.
    MetaTag,
    /// The whole system, e.g. seeding.
    System,
}

impl AuditTarget {
    /// Stored `target_type` value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Role => "role",
            Self::Permission => "permission",
            Self::MetaTag => "meta_tag",
            Self::System => "system",
        }
    }
}

impl fmt::Display for AuditTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditVerb {
    /// A new row.
    Create,
    /// An edit, including association changes.
    Update,
    /// A removal.
    Delete,
    /// A seeding run.
    Seed,
}

impl AuditVerb {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Seed => "seed",
        }
    }
}

/// Writes audit entries on behalf of the admin services.
///
/// A failed append is logged and swallowed: the admin action it
/// describes has already been decided and must not change outcome
/// because the trail could not be written.
#[derive(Clone)]
pub struct AuditLogger {
    store: Arc<dyn AuditStore>,
}

impl fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditLogger").finish_non_exhaustive()
    }
}

impl AuditLogger {
    /// Creates a new audit logger.
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// Record a committed change.
    pub async fn success(
        &self,
        ctx: Option<&RequestContext>,
        target: AuditTarget,
        verb: AuditVerb,
        target_id: Option<Uuid>,
        details: Value,
    ) {
        self.record(ctx, target, verb, target_id, AuditOutcome::Success, details)
            .await;
    }

    /// Record a policy rejection.
    pub async fn rejected(
        &self,
        ctx: &RequestContext,
        target: AuditTarget,
        verb: AuditVerb,
        target_id: Uuid,
        details: Value,
    ) {
        self.record(
            Some(ctx),
            target,
            verb,
            Some(target_id),
            AuditOutcome::Rejected,
            details,
        )
        .await;
    }

    /// Record a store failure.
    pub async fn failed(
        &self,
        ctx: &RequestContext,
        target: AuditTarget,
        verb: AuditVerb,
        target_id: Option<Uuid>,
        details: Value,
    ) {
        self.record(Some(ctx), target, verb, target_id, AuditOutcome::Failed, details)
            .await;
    }

    async fn record(
        &self,
        ctx: Option<&RequestContext>,
        target: AuditTarget,
        verb: AuditVerb,
        target_id: Option<Uuid>,
        outcome: AuditOutcome,
        details: Value,
    ) {
        let action = format!("{}.{}", target.as_str(), verb.as_str());
        let entry = CreateAuditLogEntry {
            actor_id: ctx.map(|c| c.user_id),
            action,
            target_type: target.as_str().to_string(),
            target_id,
            outcome,
            details: Some(details),
            ip_address: ctx.and_then(|c| c.ip_address.clone()),
            user_agent: ctx.and_then(|c| c.user_agent.clone()),
        };

        if let Err(e) = self.store.append_audit(&entry).await {
            error!(
                action = %entry.action,
                outcome = %entry.outcome,
                error = %e,
                "Failed to write audit entry"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_core::types::id::UserId;
    use backoffice_database::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_entry_carries_actor_and_client() {
        let store = MemoryStore::new();
        let logger = AuditLogger::new(Arc::new(store.clone()));
        let ctx = RequestContext::new(UserId::new(), "admin@mail.com", Vec::new())
            .with_client(Some("10.0.0.1".into()), Some("cli".into()));
        let target = Uuid::now_v7();

        logger
            .rejected(&ctx, AuditTarget::Role, AuditVerb::Delete, target, json!({"reason": "x"}))
            .await;

        let entries = store.audit_entries().await;
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.action, "role.delete");
        assert_eq!(entry.target_type, "role");
        assert_eq!(entry.target_id, Some(target));
        assert_eq!(entry.outcome, AuditOutcome::Rejected);
        assert_eq!(entry.actor_id, Some(ctx.user_id));
        assert_eq!(entry.ip_address.as_deref(), Some("10.0.0.1"));
    }

    #[tokio::test]
    async fn test_store_failure_is_swallowed() {
        let store = MemoryStore::new();
        store.fail_audit(true);
        let logger = AuditLogger::new(Arc::new(store.clone()));

        logger
            .success(None, AuditTarget::System, AuditVerb::Seed, None, json!({}))
            .await;

        assert!(store.audit_entries().await.is_empty());
    }
}
