//! Role CRUD with permission-set sync and super-admin protection.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, error, info, warn};
use validator::Validate;

use backoffice_auth::{
    DeletionTarget, PolicyDecision, ProtectedEntityPolicy, RbacEnforcer, SystemPermission,
};
use backoffice_core::error::AppError;
use backoffice_core::result::AppResult;
use backoffice_core::types::id::RoleId;
use backoffice_core::types::notification::Notification;
use backoffice_core::types::pagination::{PageRequest, PageResponse};
use backoffice_core::types::query::ListQuery;
use backoffice_database::{PermissionStore, RoleStore};
use backoffice_entity::permission::Permission;
use backoffice_entity::role::{RoleInput, RoleWithPermissions};

use crate::audit::{AuditLogger, AuditTarget, AuditVerb};
use crate::context::RequestContext;
use crate::outcome::ActionOutcome;
use crate::validation::FieldErrors;

const NAME_TAKEN: &str = "The name has already been taken.";

/// Manages roles and the permissions they grant.
#[derive(Clone)]
pub struct RoleService {
    roles: Arc<dyn RoleStore>,
    permissions: Arc<dyn PermissionStore>,
    rbac: Arc<RbacEnforcer>,
    policy: ProtectedEntityPolicy,
    audit: AuditLogger,
    page_size: u64,
}

impl std::fmt::Debug for RoleService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleService")
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

fn snapshot(role: &RoleWithPermissions) -> Value {
    json!({ "name": role.role.name, "permissions": role.permission_names })
}

impl RoleService {
    /// Creates a new role service.
    pub fn new(
        roles: Arc<dyn RoleStore>,
        permissions: Arc<dyn PermissionStore>,
        rbac: Arc<RbacEnforcer>,
        audit: AuditLogger,
        page_size: u64,
    ) -> Self {
        Self {
            roles,
            permissions,
            rbac,
            policy: ProtectedEntityPolicy::new(),
            audit,
            page_size,
        }
    }

    fn require_access(&self, ctx: &RequestContext) -> AppResult<()> {
        self.rbac
            .require_permission(&ctx.permissions, SystemPermission::ManageRoles)
    }

    /// Searches role names, newest first.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        search: Option<String>,
        page: u64,
    ) -> AppResult<PageResponse<RoleWithPermissions>> {
        self.require_access(ctx)?;
        let query = ListQuery::new(search, PageRequest::new(page, self.page_size));
        debug!(admin_id = %ctx.user_id, search = ?query.term(), page, "Listing roles");
        self.roles.search_roles(&query).await
    }

    /// Loads a role with its permissions for editing.
    pub async fn get(&self, ctx: &RequestContext, id: RoleId) -> AppResult<RoleWithPermissions> {
        self.require_access(ctx)?;
        self.find(id).await
    }

    /// Every permission, for the permission checkboxes.
    pub async fn permission_options(&self, ctx: &RequestContext) -> AppResult<Vec<Permission>> {
        self.require_access(ctx)?;
        self.permissions.all_permissions().await
    }

    async fn find(&self, id: RoleId) -> AppResult<RoleWithPermissions> {
        self.roles
            .find_role_with_permissions(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Role {id} not found")))
    }

    async fn validate(&self, input: &RoleInput, except: Option<RoleId>) -> AppResult<FieldErrors> {
        let mut errors = FieldErrors::from_result(input.validate());
        if !errors.has("name") {
            let taken = self
                .roles
                .find_role_by_name(&input.name)
                .await?
                .is_some_and(|other| Some(other.id) != except);
            if taken {
                errors.add("name", NAME_TAKEN);
            }
        }
        Ok(errors)
    }

    /// Creates a role granting exactly `permission_ids`.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        input: RoleInput,
    ) -> AppResult<ActionOutcome<RoleWithPermissions>> {
        self.require_access(ctx)?;

        let input = input.normalized();
        let errors = self.validate(&input, None).await?;
        if !errors.is_empty() {
            return Ok(ActionOutcome::Invalid { errors });
        }

        match self.roles.create_role(&input).await {
            Ok(role) => {
                info!(
                    admin_id = %ctx.user_id,
                    role_id = %role.role.id,
                    name = %role.role.name,
                    permissions = ?role.permission_names,
                    "Role created"
                );
                self.audit
                    .success(
                        Some(ctx),
                        AuditTarget::Role,
                        AuditVerb::Create,
                        Some(role.role.id.into_uuid()),
                        json!({ "after": snapshot(&role) }),
                    )
                    .await;
                Ok(ActionOutcome::success(
                    role,
                    Notification::success("Role created successfully."),
                ))
            }
            Err(e) => {
                error!(admin_id = %ctx.user_id, name = %input.name, error = %e, "Failed to create role");
                self.audit
                    .failed(
                        ctx,
                        AuditTarget::Role,
                        AuditVerb::Create,
                        None,
                        json!({ "name": input.name, "error": e.to_string() }),
                    )
                    .await;
                Ok(ActionOutcome::failed("Failed to save role."))
            }
        }
    }

    /// Renames a role and replaces its permission set. The super-admin
    /// role keeps its name.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: RoleId,
        input: RoleInput,
    ) -> AppResult<ActionOutcome<RoleWithPermissions>> {
        self.require_access(ctx)?;

        let before = self.find(id).await?;
        let input = input.normalized();
        let errors = self.validate(&input, Some(id)).await?;
        if !errors.is_empty() {
            return Ok(ActionOutcome::Invalid { errors });
        }

        if let PolicyDecision::Deny(reason) = self.policy.can_rename_role(&before.role, &input.name)
        {
            warn!(admin_id = %ctx.user_id, role_id = %id, %reason, "Role rename refused");
            self.audit
                .rejected(
                    ctx,
                    AuditTarget::Role,
                    AuditVerb::Update,
                    id.into_uuid(),
                    json!({ "reason": reason, "name": before.role.name, "requested_name": input.name }),
                )
                .await;
            return Ok(ActionOutcome::rejected(reason, reason.rename_notice()));
        }

        match self.roles.update_role(id, &input).await {
            Ok(after) => {
                info!(
                    admin_id = %ctx.user_id,
                    role_id = %id,
                    name = %after.role.name,
                    permissions = ?after.permission_names,
                    "Role updated"
                );
                self.audit
                    .success(
                        Some(ctx),
                        AuditTarget::Role,
                        AuditVerb::Update,
                        Some(id.into_uuid()),
                        json!({ "before": snapshot(&before), "after": snapshot(&after) }),
                    )
                    .await;
                Ok(ActionOutcome::success(
                    after,
                    Notification::success("Role updated successfully."),
                ))
            }
            Err(e) => {
                error!(admin_id = %ctx.user_id, role_id = %id, error = %e, "Failed to update role");
                self.audit
                    .failed(
                        ctx,
                        AuditTarget::Role,
                        AuditVerb::Update,
                        Some(id.into_uuid()),
                        json!({ "before": snapshot(&before), "error": e.to_string() }),
                    )
                    .await;
                Ok(ActionOutcome::failed("Failed to save role."))
            }
        }
    }

    /// Deletes a role, detaching its permissions and users. The
    /// super-admin role is never deleted.
    pub async fn delete(&self, ctx: &RequestContext, id: RoleId) -> AppResult<ActionOutcome<()>> {
        self.require_access(ctx)?;

        let role = self.find(id).await?;

        if let PolicyDecision::Deny(reason) = self
            .policy
            .can_delete(DeletionTarget::Role(&role.role), ctx.user_id)
        {
            warn!(admin_id = %ctx.user_id, role_id = %id, %reason, "Role deletion refused");
            self.audit
                .rejected(
                    ctx,
                    AuditTarget::Role,
                    AuditVerb::Delete,
                    id.into_uuid(),
                    json!({ "reason": reason, "name": role.role.name }),
                )
                .await;
            return Ok(ActionOutcome::rejected(reason, reason.notice()));
        }

        match self.roles.delete_role(id).await {
            Ok(()) => {
                info!(admin_id = %ctx.user_id, role_id = %id, name = %role.role.name, "Role deleted");
                self.audit
                    .success(
                        Some(ctx),
                        AuditTarget::Role,
                        AuditVerb::Delete,
                        Some(id.into_uuid()),
                        json!({ "before": snapshot(&role) }),
                    )
                    .await;
                Ok(ActionOutcome::success(
                    (),
                    Notification::success("Role deleted successfully."),
                ))
            }
            Err(e) => {
                error!(admin_id = %ctx.user_id, role_id = %id, error = %e, "Failed to delete role");
                self.audit
                    .failed(
                        ctx,
                        AuditTarget::Role,
                        AuditVerb::Delete,
                        Some(id.into_uuid()),
                        json!({ "before": snapshot(&role), "error": e.to_string() }),
                    )
                    .await;
                Ok(ActionOutcome::failed("Failed to delete role."))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use backoffice_auth::DenyReason;
    use backoffice_core::types::id::PermissionId;
    use backoffice_database::MemoryStore;
    use backoffice_entity::audit::AuditOutcome;

    fn service(store: &MemoryStore) -> RoleService {
        RoleService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            testing::rbac(),
            testing::audit(store),
            10,
        )
    }

    #[tokio::test]
    async fn test_update_twice_is_idempotent() {
        let store = MemoryStore::new();
        let a = testing::permission(&store, "edit posts").await;
        let b = testing::permission(&store, "publish posts").await;
        let editor = testing::role(&store, "editor", &[&a]).await;
        let service = service(&store);
        let ctx = testing::admin_ctx();
        let input = RoleInput {
            name: "editor".into(),
            permission_ids: vec![b.id, a.id],
        };

        let first = service
            .update(&ctx, editor.role.id, input.clone())
            .await
            .unwrap()
            .into_value()
            .unwrap();
        let second = service
            .update(&ctx, editor.role.id, input)
            .await
            .unwrap()
            .into_value()
            .unwrap();

        let mut first_ids = first.permission_ids.clone();
        let mut second_ids = second.permission_ids.clone();
        first_ids.sort();
        second_ids.sort();
        assert_eq!(first_ids, second_ids);
        assert_eq!(first_ids.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_permission_leaves_name_unchanged() {
        let store = MemoryStore::new();
        let editor = testing::role(&store, "editor", &[]).await;

        let outcome = service(&store)
            .update(
                &testing::admin_ctx(),
                editor.role.id,
                RoleInput {
                    name: "writer".into(),
                    permission_ids: vec![PermissionId::new()],
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.notification().unwrap().message, "Failed to save role.");
        let stored = store.find_role(editor.role.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "editor");
        let audit = store.audit_entries().await;
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].outcome, AuditOutcome::Failed);
    }

    #[tokio::test]
    async fn test_super_admin_cannot_be_deleted_or_renamed() {
        let store = MemoryStore::new();
        let protected = testing::role(&store, "super-admin", &[]).await;
        let service = service(&store);
        let ctx = testing::admin_ctx();

        let outcome = service.delete(&ctx, protected.role.id).await.unwrap();
        assert_eq!(outcome.rejection(), Some(DenyReason::SuperAdminRole));
        assert_eq!(
            outcome.notification().unwrap().message,
            "You cannot delete the super-admin role."
        );

        let outcome = service
            .update(
                &ctx,
                protected.role.id,
                RoleInput {
                    name: "root".into(),
                    permission_ids: Vec::new(),
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome.rejection(), Some(DenyReason::SuperAdminRole));

        assert!(store.find_role_by_name("super-admin").await.unwrap().is_some());
        let audit = store.audit_entries().await;
        assert_eq!(audit.len(), 2);
        assert!(audit.iter().all(|e| e.outcome == AuditOutcome::Rejected));
    }

    #[tokio::test]
    async fn test_super_admin_permissions_remain_editable() {
        let store = MemoryStore::new();
        let manage = testing::permission(&store, "manage users").await;
        let protected = testing::role(&store, "super-admin", &[]).await;

        let outcome = service(&store)
            .update(
                &testing::admin_ctx(),
                protected.role.id,
                RoleInput {
                    name: "super-admin".into(),
                    permission_ids: vec![manage.id],
                },
            )
            .await
            .unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.value().unwrap().permission_names, vec!["manage users".to_string()]);
    }

    #[tokio::test]
    async fn test_update_keeps_own_name_without_conflict() {
        let store = MemoryStore::new();
        let editor = testing::role(&store, "editor", &[]).await;
        testing::role(&store, "writer", &[]).await;
        let service = service(&store);
        let ctx = testing::admin_ctx();

        let same = service
            .update(&ctx, editor.role.id, RoleInput { name: "editor".into(), permission_ids: Vec::new() })
            .await
            .unwrap();
        assert!(same.is_success());

        let clash = service
            .update(&ctx, editor.role.id, RoleInput { name: "writer".into(), permission_ids: Vec::new() })
            .await
            .unwrap();
        assert_eq!(clash.field_errors().unwrap().get("name"), [NAME_TAKEN]);
    }
}
