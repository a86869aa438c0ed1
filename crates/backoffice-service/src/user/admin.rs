//! Admin user management: listing, create, edit and delete with role sync.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, error, info, warn};
use validator::Validate;

use backoffice_auth::{
    CredentialHasher, DeletionTarget, PolicyDecision, ProtectedEntityPolicy, RbacEnforcer,
    SystemPermission,
};
use backoffice_core::error::AppError;
use backoffice_core::result::AppResult;
use backoffice_core::types::id::UserId;
use backoffice_core::types::notification::Notification;
use backoffice_core::types::pagination::{PageRequest, PageResponse};
use backoffice_core::types::query::ListQuery;
use backoffice_database::{RoleStore, UserStore};
use backoffice_entity::role::Role;
use backoffice_entity::user::{
    CreateUser, CreateUserInput, UpdateUser, UpdateUserInput, UserWithRoles,
};

use crate::audit::{AuditLogger, AuditTarget, AuditVerb};
use crate::context::RequestContext;
use crate::outcome::ActionOutcome;
use crate::validation::FieldErrors;

const EMAIL_TAKEN: &str = "The email has already been taken.";
const PASSWORD_MISMATCH: &str = "The password confirmation does not match.";

/// Handles administrative user management operations.
#[derive(Clone)]
pub struct AdminUserService {
    /// User store.
    users: Arc<dyn UserStore>,
    /// Role store, for the role select box.
    roles: Arc<dyn RoleStore>,
    /// Password hasher.
    hasher: Arc<dyn CredentialHasher>,
    /// RBAC enforcer.
    rbac: Arc<RbacEnforcer>,
    /// Protected-entity policy.
    policy: ProtectedEntityPolicy,
    /// Audit trail writer.
    audit: AuditLogger,
    /// Rows per listing page.
    page_size: u64,
}

impl std::fmt::Debug for AdminUserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminUserService")
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

fn snapshot(user: &UserWithRoles) -> Value {
    json!({
        "name": user.user.name,
        "email": user.user.email,
        "roles": user.role_names,
    })
}

impl AdminUserService {
    /// Creates a new admin user service.
    pub fn new(
        users: Arc<dyn UserStore>,
        roles: Arc<dyn RoleStore>,
        hasher: Arc<dyn CredentialHasher>,
        rbac: Arc<RbacEnforcer>,
        audit: AuditLogger,
        page_size: u64,
    ) -> Self {
        Self {
            users,
            roles,
            hasher,
            rbac,
            policy: ProtectedEntityPolicy::new(),
            audit,
            page_size,
        }
    }

    fn require_access(&self, ctx: &RequestContext) -> AppResult<()> {
        self.rbac
            .require_permission(&ctx.permissions, SystemPermission::ManageUsers)
    }

    /// Searches users by name or email, newest first.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        search: Option<String>,
        page: u64,
    ) -> AppResult<PageResponse<UserWithRoles>> {
        self.require_access(ctx)?;
        let query = ListQuery::new(search, PageRequest::new(page, self.page_size));
        debug!(admin_id = %ctx.user_id, search = ?query.term(), page, "Listing users");
        self.users.search_users(&query).await
    }

    /// Loads a user with its roles for editing.
    pub async fn get(&self, ctx: &RequestContext, id: UserId) -> AppResult<UserWithRoles> {
        self.require_access(ctx)?;
        self.users
            .find_user_with_roles(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
    }

    /// Every role, for the role select box.
    pub async fn role_options(&self, ctx: &RequestContext) -> AppResult<Vec<Role>> {
        self.require_access(ctx)?;
        self.roles.all_roles().await
    }

    /// Creates a user, hashing its password and attaching its roles.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        input: CreateUserInput,
    ) -> AppResult<ActionOutcome<UserWithRoles>> {
        self.require_access(ctx)?;

        let input = input.normalized();
        let mut errors = FieldErrors::from_result(input.validate());
        if !errors.has("email") && self.users.find_user_by_email(&input.email).await?.is_some() {
            errors.add("email", EMAIL_TAKEN);
        }
        if !errors.is_empty() {
            debug!(admin_id = %ctx.user_id, "User create rejected by validation");
            return Ok(ActionOutcome::Invalid { errors });
        }

        let email = input.email.clone();
        let hashed = self.hasher.hash_password(&input.password);
        let written = match hashed {
            Ok(password_hash) => {
                let data = CreateUser {
                    name: input.name,
                    email: input.email,
                    password_hash,
                    role_ids: input.role_ids,
                };
                self.users.create_user(&data).await
            }
            Err(e) => Err(e),
        };

        match written {
            Ok(user) => {
                info!(
                    admin_id = %ctx.user_id,
                    new_user_id = %user.user.id,
                    email = %user.user.email,
                    roles = ?user.role_names,
                    "User created by admin"
                );
                self.audit
                    .success(
                        Some(ctx),
                        AuditTarget::User,
                        AuditVerb::Create,
                        Some(user.user.id.into_uuid()),
                        json!({ "after": snapshot(&user) }),
                    )
                    .await;
                Ok(ActionOutcome::success(
                    user,
                    Notification::success("User created successfully."),
                ))
            }
            Err(e) => {
                error!(admin_id = %ctx.user_id, email = %email, error = %e, "Failed to create user");
                self.audit
                    .failed(
                        ctx,
                        AuditTarget::User,
                        AuditVerb::Create,
                        None,
                        json!({ "email": email, "error": e.to_string() }),
                    )
                    .await;
                Ok(ActionOutcome::failed("Failed to save user."))
            }
        }
    }

    /// Updates a user's profile and role set. A blank password keeps the
    /// stored credential.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: UserId,
        input: UpdateUserInput,
    ) -> AppResult<ActionOutcome<UserWithRoles>> {
        self.require_access(ctx)?;

        let before = self
            .users
            .find_user_with_roles(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;

        let input = input.normalized();
        let mut errors = FieldErrors::from_result(input.validate());
        if !input.password_confirmed() {
            errors.add("password", PASSWORD_MISMATCH);
        }
        if !errors.has("email") {
            let taken = self
                .users
                .find_user_by_email(&input.email)
                .await?
                .is_some_and(|other| other.id != id);
            if taken {
                errors.add("email", EMAIL_TAKEN);
            }
        }
        if !errors.is_empty() {
            debug!(admin_id = %ctx.user_id, user_id = %id, "User update rejected by validation");
            return Ok(ActionOutcome::Invalid { errors });
        }

        let password_changed = input.password.is_some();
        let hashed = input
            .password
            .as_deref()
            .map(|p| self.hasher.hash_password(p))
            .transpose();
        let written = match hashed {
            Ok(password_hash) => {
                let data = UpdateUser {
                    name: input.name,
                    email: input.email,
                    password_hash,
                    role_ids: input.role_ids,
                };
                self.users.update_user(id, &data).await
            }
            Err(e) => Err(e),
        };

        match written {
            Ok(after) => {
                info!(
                    admin_id = %ctx.user_id,
                    user_id = %id,
                    password_changed,
                    roles = ?after.role_names,
                    "User updated by admin"
                );
                self.audit
                    .success(
                        Some(ctx),
                        AuditTarget::User,
                        AuditVerb::Update,
                        Some(id.into_uuid()),
                        json!({
                            "before": snapshot(&before),
                            "after": snapshot(&after),
                            "password_changed": password_changed,
                        }),
                    )
                    .await;
                Ok(ActionOutcome::success(
                    after,
                    Notification::success("User updated successfully."),
                ))
            }
            Err(e) => {
                error!(admin_id = %ctx.user_id, user_id = %id, error = %e, "Failed to update user");
                self.audit
                    .failed(
                        ctx,
                        AuditTarget::User,
                        AuditVerb::Update,
                        Some(id.into_uuid()),
                        json!({ "before": snapshot(&before), "error": e.to_string() }),
                    )
                    .await;
                Ok(ActionOutcome::failed("Failed to save user."))
            }
        }
    }

    /// Deletes a user. Administrators cannot delete their own account.
    pub async fn delete(&self, ctx: &RequestContext, id: UserId) -> AppResult<ActionOutcome<()>> {
        self.require_access(ctx)?;

        let user = self
            .users
            .find_user(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
        let details = json!({ "name": user.name, "email": user.email });

        if let PolicyDecision::Deny(reason) =
            self.policy.can_delete(DeletionTarget::User(&user), ctx.user_id)
        {
            warn!(admin_id = %ctx.user_id, user_id = %id, %reason, "User deletion refused");
            self.audit
                .rejected(
                    ctx,
                    AuditTarget::User,
                    AuditVerb::Delete,
                    id.into_uuid(),
                    json!({ "reason": reason, "user": details }),
                )
                .await;
            return Ok(ActionOutcome::rejected(reason, reason.notice()));
        }

        match self.users.delete_user(id).await {
            Ok(()) => {
                info!(admin_id = %ctx.user_id, user_id = %id, email = %user.email, "User deleted by admin");
                self.audit
                    .success(
                        Some(ctx),
                        AuditTarget::User,
                        AuditVerb::Delete,
                        Some(id.into_uuid()),
                        json!({ "before": details }),
                    )
                    .await;
                Ok(ActionOutcome::success(
                    (),
                    Notification::success("User deleted successfully."),
                ))
            }
            Err(e) => {
                error!(admin_id = %ctx.user_id, user_id = %id, error = %e, "Failed to delete user");
                self.audit
                    .failed(
                        ctx,
                        AuditTarget::User,
                        AuditVerb::Delete,
                        Some(id.into_uuid()),
                        json!({ "before": details, "error": e.to_string() }),
                    )
                    .await;
                Ok(ActionOutcome::failed("Failed to delete user."))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use backoffice_core::error::ErrorKind;
    use backoffice_core::types::notification::NotificationKind;
    use backoffice_database::MemoryStore;
    use backoffice_entity::audit::AuditOutcome;

    fn service(store: &MemoryStore) -> AdminUserService {
        AdminUserService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            testing::hasher(),
            testing::rbac(),
            testing::audit(store),
            10,
        )
    }

    fn service_with_broken_hasher(store: &MemoryStore) -> AdminUserService {
        AdminUserService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(testing::BrokenHasher),
            testing::rbac(),
            testing::audit(store),
            10,
        )
    }

    fn create_input(email: &str) -> CreateUserInput {
        CreateUserInput {
            name: "Alice".into(),
            email: email.into(),
            password: "password123".into(),
            password_confirmation: "password123".into(),
            role_ids: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_create_hashes_password_and_attaches_roles() {
        let store = MemoryStore::new();
        let editor = testing::role(&store, "editor", &[]).await;
        let mut input = create_input("alice@mail.com");
        input.role_ids = vec![editor.role.id];

        let outcome = service(&store)
            .create(&testing::admin_ctx(), input)
            .await
            .unwrap();

        let notification = outcome.notification().cloned().unwrap();
        assert_eq!(notification.kind, NotificationKind::Success);
        assert_eq!(notification.message, "User created successfully.");
        let user = outcome.into_value().unwrap();
        assert_eq!(user.role_names, vec!["editor".to_string()]);
        assert!(user.user.password_hash.starts_with("$argon2id$"));
        assert!(
            testing::hasher()
                .verify_password("password123", &user.user.password_hash)
                .unwrap()
        );

        let audit = store.audit_entries().await;
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].action, "user.create");
        assert_eq!(audit[0].outcome, AuditOutcome::Success);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_invalid_and_not_audited() {
        let store = MemoryStore::new();
        testing::user(&store, "Alice", "alice@mail.com").await;

        let outcome = service(&store)
            .create(&testing::admin_ctx(), create_input("ALICE@mail.com"))
            .await
            .unwrap();

        let errors = outcome.field_errors().unwrap();
        assert_eq!(errors.get("email"), [EMAIL_TAKEN]);
        assert_eq!(store.count_users().await.unwrap(), 1);
        assert!(store.audit_entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_blank_password_keeps_hash() {
        let store = MemoryStore::new();
        let existing = testing::user(&store, "Bob", "bob@mail.com").await;
        let id = existing.user.id;

        let outcome = service(&store)
            .update(
                &testing::admin_ctx(),
                id,
                UpdateUserInput {
                    name: "Robert".into(),
                    email: "bob@mail.com".into(),
                    password: Some(String::new()),
                    password_confirmation: Some(String::new()),
                    role_ids: Vec::new(),
                },
            )
            .await
            .unwrap();

        let user = outcome.into_value().unwrap();
        assert_eq!(user.user.name, "Robert");
        assert_eq!(user.user.password_hash, existing.user.password_hash);
    }

    #[tokio::test]
    async fn test_update_unconfirmed_password_is_invalid() {
        let store = MemoryStore::new();
        let existing = testing::user(&store, "Bob", "bob@mail.com").await;

        let outcome = service(&store)
            .update(
                &testing::admin_ctx(),
                existing.user.id,
                UpdateUserInput {
                    name: "Bob".into(),
                    email: "bob@mail.com".into(),
                    password: Some("newsecret1".into()),
                    password_confirmation: Some("newsecret2".into()),
                    role_ids: Vec::new(),
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.field_errors().unwrap().get("password"), [PASSWORD_MISMATCH]);
    }

    #[tokio::test]
    async fn test_update_missing_user_is_not_found() {
        let store = MemoryStore::new();
        let err = service(&store)
            .update(&testing::admin_ctx(), UserId::new(), UpdateUserInput::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_cannot_delete_own_account() {
        let store = MemoryStore::new();
        let me = testing::user(&store, "Me", "me@mail.com").await;
        let ctx = testing::ctx_with(me.user.id, vec!["manage users".into()]);

        let outcome = service(&store).delete(&ctx, me.user.id).await.unwrap();

        assert_eq!(outcome.rejection(), Some(backoffice_auth::DenyReason::OwnAccount));
        assert_eq!(
            outcome.notification().unwrap().message,
            "You cannot delete your own account."
        );
        assert!(store.find_user(me.user.id).await.unwrap().is_some());
        let audit = store.audit_entries().await;
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].outcome, AuditOutcome::Rejected);
    }

    #[tokio::test]
    async fn test_storage_failure_is_generic_and_audited() {
        let store = MemoryStore::new();
        let other = testing::user(&store, "Other", "other@mail.com").await;
        store.fail_writes(true);

        let outcome = service(&store)
            .delete(&testing::admin_ctx(), other.user.id)
            .await
            .unwrap();

        let notification = outcome.notification().unwrap();
        assert_eq!(notification.kind, NotificationKind::Danger);
        assert_eq!(notification.message, "Failed to delete user.");
        assert!(store.find_user(other.user.id).await.unwrap().is_some());
        let audit = store.audit_entries().await;
        assert_eq!(audit[0].outcome, AuditOutcome::Failed);
    }

    #[tokio::test]
    async fn test_requires_manage_users() {
        let store = MemoryStore::new();
        let ctx = testing::ctx_with(UserId::new(), vec!["manage roles".into()]);

        let err = service(&store).list(&ctx, None, 1).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }

    #[tokio::test]
    async fn test_hashing_failure_on_create_is_generic_and_audited() {
        let store = MemoryStore::new();

        let outcome = service_with_broken_hasher(&store)
            .create(&testing::admin_ctx(), create_input("alice@mail.com"))
            .await
            .unwrap();

        let notification = outcome.notification().unwrap();
        assert_eq!(notification.kind, NotificationKind::Danger);
        assert_eq!(notification.message, "Failed to save user.");
        assert!(store.find_user_by_email("alice@mail.com").await.unwrap().is_none());

        let audit = store.audit_entries().await;
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].action, "user.create");
        assert_eq!(audit[0].outcome, AuditOutcome::Failed);
    }

    #[tokio::test]
    async fn test_hashing_failure_on_password_change_keeps_user() {
        let store = MemoryStore::new();
        let alice = testing::user(&store, "Alice", "alice@mail.com").await;

        let outcome = service_with_broken_hasher(&store)
            .update(
                &testing::admin_ctx(),
                alice.user.id,
                UpdateUserInput {
                    name: "Alice Renamed".into(),
                    email: "alice@mail.com".into(),
                    password: Some("new-password".into()),
                    password_confirmation: Some("new-password".into()),
                    role_ids: Vec::new(),
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.notification().unwrap().message, "Failed to save user.");
        let stored = store.find_user(alice.user.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Alice");
        assert_eq!(stored.password_hash, alice.user.password_hash);
        assert_eq!(store.audit_entries().await[0].outcome, AuditOutcome::Failed);
    }
}
