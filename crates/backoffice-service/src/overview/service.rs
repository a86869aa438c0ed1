//! Totals and top lists shown on the admin dashboard.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use backoffice_core::result::AppResult;
use backoffice_database::{PermissionStore, RoleStore, UserStore};
use backoffice_entity::permission::PermissionUsage;
use backoffice_entity::role::RoleUsage;
use backoffice_entity::user::User;

use crate::context::RequestContext;

/// Dashboard figures.
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub total_users: u64,
    pub total_roles: u64,
    pub total_permissions: u64,
    /// Most recently created users.
    pub latest_users: Vec<User>,
    /// Roles held by the most users.
    pub top_roles: Vec<RoleUsage>,
    /// Permissions granted by the most roles.
    pub top_permissions: Vec<PermissionUsage>,
}

/// Builds the dashboard overview.
#[derive(Clone)]
pub struct OverviewService {
    users: Arc<dyn UserStore>,
    roles: Arc<dyn RoleStore>,
    permissions: Arc<dyn PermissionStore>,
    limit: u64,
}

impl std::fmt::Debug for OverviewService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverviewService")
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

impl OverviewService {
    /// Creates a new overview service; `limit` caps each list.
    pub fn new(
        users: Arc<dyn UserStore>,
        roles: Arc<dyn RoleStore>,
        permissions: Arc<dyn PermissionStore>,
        limit: u64,
    ) -> Self {
        Self {
            users,
            roles,
            permissions,
            limit,
        }
    }

    /// Gather every figure concurrently.
    pub async fn overview(&self, ctx: &RequestContext) -> AppResult<Overview> {
        debug!(admin_id = %ctx.user_id, limit = self.limit, "Building overview");

        let (total_users, total_roles, total_permissions, latest_users, top_roles, top_permissions) =
            tokio::try_join!(
                self.users.count_users(),
                self.roles.count_roles(),
                self.permissions.count_permissions(),
                self.users.latest_users(self.limit),
                self.roles.top_roles(self.limit),
                self.permissions.top_permissions(self.limit),
            )?;

        Ok(Overview {
            total_users,
            total_roles,
            total_permissions,
            latest_users,
            top_roles,
            top_permissions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use backoffice_database::MemoryStore;
    use backoffice_entity::user::UpdateUser;

    #[tokio::test]
    async fn test_overview_counts_and_rankings() {
        let store = MemoryStore::new();
        let manage = testing::permission(&store, "manage users").await;
        let publish = testing::permission(&store, "publish posts").await;
        let admin = testing::role(&store, "admin", &[&manage, &publish]).await;
        let editor = testing::role(&store, "editor", &[&publish]).await;
        testing::role(&store, "guest", &[]).await;

        for i in 0..7 {
            let user = testing::user(&store, &format!("User {i}"), &format!("user{i}@mail.com")).await;
            let role_ids = if i < 4 { vec![editor.role.id] } else { vec![admin.role.id] };
            store
                .update_user(
                    user.user.id,
                    &UpdateUser {
                        name: user.user.name.clone(),
                        email: user.user.email.clone(),
                        password_hash: None,
                        role_ids,
                    },
                )
                .await
                .unwrap();
        }

        let service = OverviewService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
            5,
        );
        let overview = service.overview(&testing::admin_ctx()).await.unwrap();

        assert_eq!(overview.total_users, 7);
        assert_eq!(overview.total_roles, 3);
        assert_eq!(overview.total_permissions, 2);
        assert_eq!(overview.latest_users.len(), 5);
        assert_eq!(overview.latest_users[0].email, "user6@mail.com");

        assert_eq!(overview.top_roles[0].name, "editor");
        assert_eq!(overview.top_roles[0].users_count, 4);
        assert_eq!(overview.top_roles[1].name, "admin");
        assert_eq!(overview.top_roles[2].users_count, 0);

        assert_eq!(overview.top_permissions[0].name, "publish posts");
        assert_eq!(overview.top_permissions[0].roles_count, 2);
    }
}
