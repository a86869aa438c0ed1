//! Permission CRUD. The core permissions are never deleted or renamed.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error, info, warn};
use validator::Validate;

use backoffice_auth::{
    DeletionTarget, PolicyDecision, ProtectedEntityPolicy, RbacEnforcer, SystemPermission,
};
use backoffice_core::error::AppError;
use backoffice_core::result::AppResult;
use backoffice_core::types::id::PermissionId;
use backoffice_core::types::notification::Notification;
use backoffice_core::types::pagination::{PageRequest, PageResponse};
use backoffice_core::types::query::ListQuery;
use backoffice_database::PermissionStore;
use backoffice_entity::permission::{Permission, PermissionInput};

use crate::audit::{AuditLogger, AuditTarget, AuditVerb};
use crate::context::RequestContext;
use crate::outcome::ActionOutcome;
use crate::validation::FieldErrors;

const NAME_TAKEN: &str = "The name has already been taken.";

/// Manages permissions.
#[derive(Clone)]
pub struct PermissionService {
    permissions: Arc<dyn PermissionStore>,
    rbac: Arc<RbacEnforcer>,
    policy: ProtectedEntityPolicy,
    audit: AuditLogger,
    page_size: u64,
}

impl std::fmt::Debug for PermissionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionService")
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl PermissionService {
    /// Creates a new permission service.
    pub fn new(
        permissions: Arc<dyn PermissionStore>,
        rbac: Arc<RbacEnforcer>,
        audit: AuditLogger,
        page_size: u64,
    ) -> Self {
        Self {
            permissions,
            rbac,
            policy: ProtectedEntityPolicy::new(),
            audit,
            page_size,
        }
    }

    fn require_access(&self, ctx: &RequestContext) -> AppResult<()> {
        self.rbac
            .require_permission(&ctx.permissions, SystemPermission::ManagePermissions)
    }

    /// Searches permission names, newest first.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        search: Option<String>,
        page: u64,
    ) -> AppResult<PageResponse<Permission>> {
        self.require_access(ctx)?;
        let query = ListQuery::new(search, PageRequest::new(page, self.page_size));
        debug!(admin_id = %ctx.user_id, search = ?query.term(), page, "Listing permissions");
        self.permissions.search_permissions(&query).await
    }

    /// Loads a permission for editing.
    pub async fn get(&self, ctx: &RequestContext, id: PermissionId) -> AppResult<Permission> {
        self.require_access(ctx)?;
        self.find(id).await
    }

    async fn find(&self, id: PermissionId) -> AppResult<Permission> {
        self.permissions
            .find_permission(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Permission {id} not found")))
    }

    async fn validate(
        &self,
        input: &PermissionInput,
        except: Option<PermissionId>,
    ) -> AppResult<FieldErrors> {
        let mut errors = FieldErrors::from_result(input.validate());
        if !errors.has("name") {
            let taken = self
                .permissions
                .find_permission_by_name(&input.name)
                .await?
                .is_some_and(|other| Some(other.id) != except);
            if taken {
                errors.add("name", NAME_TAKEN);
            }
        }
        Ok(errors)
    }

    /// Creates a permission.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        input: PermissionInput,
    ) -> AppResult<ActionOutcome<Permission>> {
        self.require_access(ctx)?;

        let input = input.normalized();
        let errors = self.validate(&input, None).await?;
        if !errors.is_empty() {
            return Ok(ActionOutcome::Invalid { errors });
        }

        match self.permissions.create_permission(&input).await {
            Ok(permission) => {
                info!(admin_id = %ctx.user_id, permission_id = %permission.id, name = %permission.name, "Permission created");
                self.audit
                    .success(
                        Some(ctx),
                        AuditTarget::Permission,
                        AuditVerb::Create,
                        Some(permission.id.into_uuid()),
                        json!({ "after": { "name": permission.name } }),
                    )
                    .await;
                Ok(ActionOutcome::success(
                    permission,
                    Notification::success("Permission created successfully."),
                ))
            }
            Err(e) => {
                error!(admin_id = %ctx.user_id, name = %input.name, error = %e, "Failed to create permission");
                self.audit
                    .failed(
                        ctx,
                        AuditTarget::Permission,
                        AuditVerb::Create,
                        None,
                        json!({ "name": input.name, "error": e.to_string() }),
                    )
                    .await;
                Ok(ActionOutcome::failed("Failed to save permission."))
            }
        }
    }

    /// Renames a permission.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: PermissionId,
        input: PermissionInput,
    ) -> AppResult<ActionOutcome<Permission>> {
        self.require_access(ctx)?;

        let before = self.find(id).await?;
        let input = input.normalized();
        let errors = self.validate(&input, Some(id)).await?;
        if !errors.is_empty() {
            return Ok(ActionOutcome::Invalid { errors });
        }

        if let PolicyDecision::Deny(reason) =
            self.policy.can_rename_permission(&before, &input.name)
        {
            warn!(admin_id = %ctx.user_id, permission_id = %id, %reason, "Permission rename refused");
            self.audit
                .rejected(
                    ctx,
                    AuditTarget::Permission,
                    AuditVerb::Update,
                    id.into_uuid(),
                    json!({ "reason": reason, "name": before.name, "requested_name": input.name }),
                )
                .await;
            return Ok(ActionOutcome::rejected(reason, reason.rename_notice()));
        }

        match self.permissions.update_permission(id, &input).await {
            Ok(after) => {
                info!(admin_id = %ctx.user_id, permission_id = %id, old_name = %before.name, name = %after.name, "Permission updated");
                self.audit
                    .success(
                        Some(ctx),
                        AuditTarget::Permission,
                        AuditVerb::Update,
                        Some(id.into_uuid()),
                        json!({ "before": { "name": before.name }, "after": { "name": after.name } }),
                    )
                    .await;
                Ok(ActionOutcome::success(
                    after,
                    Notification::success("Permission updated successfully."),
                ))
            }
            Err(e) => {
                error!(admin_id = %ctx.user_id, permission_id = %id, error = %e, "Failed to update permission");
                self.audit
                    .failed(
                        ctx,
                        AuditTarget::Permission,
                        AuditVerb::Update,
                        Some(id.into_uuid()),
                        json!({ "before": { "name": before.name }, "error": e.to_string() }),
                    )
                    .await;
                Ok(ActionOutcome::failed("Failed to save permission."))
            }
        }
    }

    /// Deletes a permission, detaching it from every role.
    pub async fn delete(
        &self,
        ctx: &RequestContext,
        id: PermissionId,
    ) -> AppResult<ActionOutcome<()>> {
        self.require_access(ctx)?;

        let permission = self.find(id).await?;

        if let PolicyDecision::Deny(reason) = self
            .policy
            .can_delete(DeletionTarget::Permission(&permission), ctx.user_id)
        {
            warn!(admin_id = %ctx.user_id, permission_id = %id, %reason, "Permission deletion refused");
            self.audit
                .rejected(
                    ctx,
                    AuditTarget::Permission,
                    AuditVerb::Delete,
                    id.into_uuid(),
                    json!({ "reason": reason, "name": permission.name }),
                )
                .await;
            return Ok(ActionOutcome::rejected(reason, reason.notice()));
        }

        match self.permissions.delete_permission(id).await {
            Ok(()) => {
                info!(admin_id = %ctx.user_id, permission_id = %id, name = %permission.name, "Permission deleted");
                self.audit
                    .success(
                        Some(ctx),
                        AuditTarget::Permission,
                        AuditVerb::Delete,
                        Some(id.into_uuid()),
                        json!({ "before": { "name": permission.name } }),
                    )
                    .await;
                Ok(ActionOutcome::success(
                    (),
                    Notification::success("Permission deleted successfully."),
                ))
            }
            Err(e) => {
                error!(admin_id = %ctx.user_id, permission_id = %id, error = %e, "Failed to delete permission");
                self.audit
                    .failed(
                        ctx,
                        AuditTarget::Permission,
                        AuditVerb::Delete,
                        Some(id.into_uuid()),
                        json!({ "before": { "name": permission.name }, "error": e.to_string() }),
                    )
                    .await;
                Ok(ActionOutcome::failed("Failed to delete permission."))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use backoffice_auth::DenyReason;
    use backoffice_auth::policy::CORE_PERMISSIONS;
    use backoffice_database::{MemoryStore, RoleStore};

    fn service(store: &MemoryStore) -> PermissionService {
        PermissionService::new(
            Arc::new(store.clone()),
            testing::rbac(),
            testing::audit(store),
            10,
        )
    }

    #[tokio::test]
    async fn test_core_permissions_survive_delete() {
        let store = MemoryStore::new();
        let service = service(&store);
        let ctx = testing::admin_ctx();

        for name in CORE_PERMISSIONS {
            let permission = testing::permission(&store, name).await;
            let outcome = service.delete(&ctx, permission.id).await.unwrap();
            assert_eq!(outcome.rejection(), Some(DenyReason::CorePermission));
            assert_eq!(
                outcome.notification().unwrap().message,
                "You cannot delete core system permissions."
            );
        }
        assert_eq!(store.count_permissions().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_core_permission_rename_refused() {
        let store = MemoryStore::new();
        let core = testing::permission(&store, "manage roles").await;

        let outcome = service(&store)
            .update(
                &testing::admin_ctx(),
                core.id,
                PermissionInput {
                    name: "manage groups".into(),
                },
            )
            .await
            .unwrap();

        assert_eq!(
            outcome.notification().unwrap().message,
            "You cannot rename core system permissions."
        );
        assert!(store.find_permission_by_name("manage roles").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_detaches_from_roles() {
        let store = MemoryStore::new();
        let publish = testing::permission(&store, "publish posts").await;
        let editor = testing::role(&store, "editor", &[&publish]).await;

        let outcome = service(&store)
            .delete(&testing::admin_ctx(), publish.id)
            .await
            .unwrap();

        assert_eq!(
            outcome.notification().unwrap().message,
            "Permission deleted successfully."
        );
        let role = store
            .find_role_with_permissions(editor.role.id)
            .await
            .unwrap()
            .unwrap();
        assert!(role.permission_ids.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_name_is_invalid() {
        let store = MemoryStore::new();
        testing::permission(&store, "publish posts").await;

        let outcome = service(&store)
            .create(
                &testing::admin_ctx(),
                PermissionInput {
                    name: " publish posts ".into(),
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.field_errors().unwrap().get("name"), [NAME_TAKEN]);
        assert_eq!(store.count_permissions().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_permission_is_not_found() {
        let store = MemoryStore::new();
        let err = service(&store)
            .delete(&testing::admin_ctx(), PermissionId::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(store.audit_entries().await.is_empty());
    }
}
