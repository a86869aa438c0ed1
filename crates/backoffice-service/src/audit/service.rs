//! Read access to the audit trail.

use std::sync::Arc;

use tracing::debug;

use backoffice_auth::{RbacEnforcer, SystemPermission};
use backoffice_core::error::AppError;
use backoffice_core::result::AppResult;
use backoffice_database::AuditStore;
use backoffice_entity::audit::{AuditLogEntry, AuditQuery};
use backoffice_core::types::pagination::PageResponse;

use crate::context::RequestContext;

/// Lists audit entries for administrators.
pub struct AuditService {
    store: Arc<dyn AuditStore>,
    rbac: Arc<RbacEnforcer>,
}

impl std::fmt::Debug for AuditService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditService").finish_non_exhaustive()
    }
}

impl AuditService {
    /// Creates a new audit service.
    pub fn new(store: Arc<dyn AuditStore>, rbac: Arc<RbacEnforcer>) -> Self {
        Self { store, rbac }
    }

    /// Filtered audit listing, newest first.
    ///
    /// Any holder of a management permission may read the trail.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        query: &AuditQuery,
    ) -> AppResult<PageResponse<AuditLogEntry>> {
        let allowed = SystemPermission::ALL
            .iter()
            .any(|p| self.rbac.has_permission(&ctx.permissions, *p));
        if !allowed {
            return Err(AppError::authorization(
                "Reading the audit trail requires a management permission",
            ));
        }

        debug!(
            actor = %ctx.user_id,
            target_type = ?query.target_type,
            action = ?query.action,
            page = query.page.page,
            "Listing audit entries"
        );
        self.store.search_audit(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_core::error::ErrorKind;
    use backoffice_core::types::id::UserId;
    use backoffice_database::MemoryStore;
    use backoffice_entity::audit::{AuditOutcome, CreateAuditLogEntry};

    async fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        for (action, target) in [("role.delete", "role"), ("user.create", "user")] {
            store
                .append_audit(&CreateAuditLogEntry {
                    actor_id: None,
                    action: action.into(),
                    target_type: target.into(),
                    target_id: None,
                    outcome: AuditOutcome::Success,
                    details: None,
                    ip_address: None,
                    user_agent: None,
                })
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_filters_by_target_type() {
        let store = seeded_store().await;
        let service = AuditService::new(Arc::new(store), Arc::new(RbacEnforcer::new()));
        let ctx = RequestContext::new(UserId::new(), "a@mail.com", vec!["manage roles".into()]);

        let query = AuditQuery {
            target_type: Some("role".into()),
            ..Default::default()
        };
        let page = service.list(&ctx, &query).await.unwrap();
        assert_eq!(page.total_items, 1);
        assert_eq!(page.items[0].action, "role.delete");
    }

    #[tokio::test]
    async fn test_requires_management_permission() {
        let store = seeded_store().await;
        let service = AuditService::new(Arc::new(store), Arc::new(RbacEnforcer::new()));
        let ctx = RequestContext::new(UserId::new(), "u@mail.com", Vec::new());

        let err = service.list(&ctx, &AuditQuery::default()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }
}
