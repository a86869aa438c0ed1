//! Idempotent seeding of the core RBAC data, demo accounts and the home
//! meta tag.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::info;

use backoffice_auth::policy::SUPER_ADMIN_ROLE;
use backoffice_auth::{PasswordHasher, SystemPermission};
use backoffice_core::error::AppError;
use backoffice_core::result::AppResult;
use backoffice_core::types::id::{PermissionId, RoleId};
use backoffice_database::{MetaTagStore, PermissionStore, RoleStore, UserStore};
use backoffice_entity::meta_tag::{HOME_PAGE, MetaTagInput};
use backoffice_entity::permission::PermissionInput;
use backoffice_entity::role::RoleInput;
use backoffice_entity::user::CreateUser;

use crate::audit::{AuditLogger, AuditTarget, AuditVerb};

/// Minimum length of the seeded accounts' password.
const MIN_PASSWORD_LEN: usize = 8;

/// Roles and the permissions they are seeded with.
const SEED_ROLES: [(&str, &[SystemPermission]); 3] = [
    (SUPER_ADMIN_ROLE, &SystemPermission::ALL),
    (
        "admin",
        &[SystemPermission::ManageUsers, SystemPermission::ManageRoles],
    ),
    ("user", &[]),
];

/// Accounts as (name, email, role).
const SEED_USERS: [(&str, &str, &str); 3] = [
    ("Super Admin", "superadmin@mail.com", SUPER_ADMIN_ROLE),
    ("Admin", "admin@mail.com", "admin"),
    ("User", "user@mail.com", "user"),
];

/// What a seeding run created. Existing rows are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// Core permissions inserted.
    pub permissions_created: usize,
    /// Roles inserted.
    pub roles_created: usize,
    /// Demo accounts inserted.
    pub users_created: usize,
    /// Meta tags inserted (at most the home page).
    pub meta_tags_created: usize,
}

/// Seeds a fresh installation.
#[derive(Clone)]
pub struct Seeder {
    users: Arc<dyn UserStore>,
    roles: Arc<dyn RoleStore>,
    permissions: Arc<dyn PermissionStore>,
    meta_tags: Arc<dyn MetaTagStore>,
    hasher: Arc<PasswordHasher>,
    audit: AuditLogger,
}

impl Seeder {
    /// Creates a new seeder.
    pub fn new(
        users: Arc<dyn UserStore>,
        roles: Arc<dyn RoleStore>,
        permissions: Arc<dyn PermissionStore>,
        meta_tags: Arc<dyn MetaTagStore>,
        hasher: Arc<PasswordHasher>,
        audit: AuditLogger,
    ) -> Self {
        Self {
            users,
            roles,
            permissions,
            meta_tags,
            hasher,
            audit,
        }
    }

    /// Create whatever is missing. Every seeded account gets `password`.
    pub async fn run(&self, password: &str) -> AppResult<SeedReport> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::validation(format!(
                "The seed password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let mut report = SeedReport::default();

        let mut permission_ids: Vec<(SystemPermission, PermissionId)> = Vec::new();
        for permission in SystemPermission::ALL {
            let id = match self.permissions.find_permission_by_name(permission.name()).await? {
                Some(existing) => existing.id,
                None => {
                    report.permissions_created += 1;
                    self.permissions
                        .create_permission(&PermissionInput {
                            name: permission.name().to_string(),
                        })
                        .await?
                        .id
                }
            };
            permission_ids.push((permission, id));
        }

        let mut role_ids: Vec<(&str, RoleId)> = Vec::new();
        for (name, grants) in SEED_ROLES {
            let id = match self.roles.find_role_by_name(name).await? {
                Some(existing) => existing.id,
                None => {
                    let input = RoleInput {
                        name: name.to_string(),
                        permission_ids: permission_ids
                            .iter()
                            .filter(|(p, _)| grants.contains(p))
                            .map(|(_, id)| *id)
                            .collect(),
                    };
                    report.roles_created += 1;
                    self.roles.create_role(&input).await?.role.id
                }
            };
            role_ids.push((name, id));
        }

        for (name, email, role) in SEED_USERS {
            if self.users.find_user_by_email(email).await?.is_some() {
                continue;
            }
            let data = CreateUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash: self.hasher.hash_password(password)?,
                role_ids: role_ids
                    .iter()
                    .filter(|(r, _)| *r == role)
                    .map(|(_, id)| *id)
                    .collect(),
            };
            self.users.create_user(&data).await?;
            report.users_created += 1;
        }

        if self.meta_tags.find_meta_tag_by_page(HOME_PAGE).await?.is_none() {
            self.meta_tags.create_meta_tag(&home_meta_tag()).await?;
            report.meta_tags_created += 1;
        }

        info!(
            permissions = report.permissions_created,
            roles = report.roles_created,
            users = report.users_created,
            meta_tags = report.meta_tags_created,
            "Seeding complete"
        );
        self.audit
            .success(
                None,
                AuditTarget::System,
                AuditVerb::Seed,
                None,
                json!(report),
            )
            .await;

        Ok(report)
    }
}

fn home_meta_tag() -> MetaTagInput {
    let title = "Backoffice - Home";
    let description = "Welcome to the backoffice, a modern web application with a complete feature set";
    MetaTagInput {
        page: HOME_PAGE.to_string(),
        title: Some(title.into()),
        description: Some(description.into()),
        keywords: Some("backoffice, admin, web, application".into()),
        author: Some("Backoffice Team".into()),
        og_title: Some(title.into()),
        og_description: Some(description.into()),
        og_image: Some("/images/og-image.jpg".into()),
        og_type: None,
        twitter_card: None,
        twitter_title: Some(title.into()),
        twitter_description: Some(description.into()),
        twitter_image: Some("/images/twitter-image.jpg".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use backoffice_database::MemoryStore;

    fn seeder(store: &MemoryStore) -> Seeder {
        Seeder::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            testing::hasher(),
            testing::audit(store),
        )
    }

    #[tokio::test]
    async fn test_seed_creates_rbac_data() {
        let store = MemoryStore::new();
        let report = seeder(&store).run("admin12345").await.unwrap();

        assert_eq!(
            report,
            SeedReport {
                permissions_created: 3,
                roles_created: 3,
                users_created: 3,
                meta_tags_created: 1,
            }
        );

        let admin = store
            .find_user_by_email("admin@mail.com")
            .await
            .unwrap()
            .unwrap();
        let mut granted = store.permission_names_for(admin.id).await.unwrap();
        granted.sort();
        assert_eq!(granted, vec!["manage roles", "manage users"]);

        let root = store
            .find_user_by_email("superadmin@mail.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(store.permission_names_for(root.id).await.unwrap().len(), 3);

        let home = store.find_meta_tag_by_page("home").await.unwrap().unwrap();
        assert_eq!(home.og_type, "website");
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = MemoryStore::new();
        let seeder = seeder(&store);
        seeder.run("admin12345").await.unwrap();

        let second = seeder.run("admin12345").await.unwrap();
        assert_eq!(second, SeedReport::default());
        assert_eq!(store.count_users().await.unwrap(), 3);
        assert_eq!(store.count_roles().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_seed_rejects_short_password() {
        let store = MemoryStore::new();
        let err = seeder(&store).run("short").await.unwrap_err();
        assert_eq!(err.kind, backoffice_core::error::ErrorKind::Validation);
        assert_eq!(store.count_permissions().await.unwrap(), 0);
    }
}
