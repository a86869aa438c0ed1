//! Users, roles and permissions for the in-memory store.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::Utc;

use backoffice_core::error::AppError;
use backoffice_core::result::AppResult;
use backoffice_core::types::id::{PermissionId, RoleId, UserId};
use backoffice_core::types::pagination::PageResponse;
use backoffice_core::types::query::ListQuery;
use backoffice_entity::permission::{Permission, PermissionInput, PermissionUsage};
use backoffice_entity::role::{Role, RoleInput, RoleUsage, RoleWithPermissions};
use backoffice_entity::user::{CreateUser, UpdateUser, User, UserWithRoles};

use super::{MemoryStore, State, paginate};
use crate::store::{PermissionStore, RoleStore, UserStore};
use crate::sync::plan_sync;

impl State {
    fn user_with_roles(&self, user: User) -> UserWithRoles {
        let mut roles: Vec<&Role> = self
            .user_roles
            .iter()
            .filter(|(u, _)| *u == user.id)
            .filter_map(|(_, r)| self.roles.get(r))
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));

        UserWithRoles {
            role_ids: roles.iter().map(|r| r.id).collect(),
            role_names: roles.iter().map(|r| r.name.clone()).collect(),
            user,
        }
    }

    fn role_with_permissions(&self, role: Role) -> RoleWithPermissions {
        let mut permissions: Vec<&Permission> = self
            .role_permissions
            .iter()
            .filter(|(r, _)| *r == role.id)
            .filter_map(|(_, p)| self.permissions.get(p))
            .collect();
        permissions.sort_by(|a, b| a.name.cmp(&b.name));

        RoleWithPermissions {
            permission_ids: permissions.iter().map(|p| p.id).collect(),
            permission_names: permissions.iter().map(|p| p.name.clone()).collect(),
            role,
        }
    }

    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        let email = email.to_lowercase();
        self.users
            .values()
            .any(|u| Some(u.id) != except && u.email.to_lowercase() == email)
    }

    fn sync_user_roles(&mut self, user_id: UserId, role_ids: &[RoleId]) -> AppResult<()> {
        if role_ids.iter().any(|id| !self.roles.contains_key(id)) {
            return Err(AppError::conflict("One or more selected roles do not exist"));
        }
        let current: Vec<RoleId> = self
            .user_roles
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, r)| *r)
            .collect();

        let plan = plan_sync(&current, role_ids);
        for role_id in plan.detach {
            self.user_roles.remove(&(user_id, role_id));
        }
        for role_id in plan.attach {
            self.user_roles.insert((user_id, role_id));
        }
        Ok(())
    }

    fn sync_role_permissions(
        &mut self,
        role_id: RoleId,
        permission_ids: &[PermissionId],
    ) -> AppResult<()> {
        if permission_ids
            .iter()
            .any(|id| !self.permissions.contains_key(id))
        {
            return Err(AppError::conflict(
                "One or more selected permissions do not exist",
            ));
        }
        let current: Vec<PermissionId> = self
            .role_permissions
            .iter()
            .filter(|(r, _)| *r == role_id)
            .map(|(_, p)| *p)
            .collect();

        let plan = plan_sync(&current, permission_ids);
        for permission_id in plan.detach {
            self.role_permissions.remove(&(role_id, permission_id));
        }
        for permission_id in plan.attach {
            self.role_permissions.insert((role_id, permission_id));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.read(|s| s.users.get(&id).cloned()).await)
    }

    async fn find_user_with_roles(&self, id: UserId) -> AppResult<Option<UserWithRoles>> {
        Ok(self
            .read(|s| s.users.get(&id).cloned().map(|u| s.user_with_roles(u)))
            .await)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let email = email.to_lowercase();
        Ok(self
            .read(|s| {
                s.users
                    .values()
                    .find(|u| u.email.to_lowercase() == email)
                    .cloned()
            })
            .await)
    }

    async fn search_users(&self, query: &ListQuery) -> AppResult<PageResponse<UserWithRoles>> {
        Ok(self
            .read(|s| {
                let rows: Vec<UserWithRoles> = s
                    .users
                    .values()
                    .cloned()
                    .map(|u| s.user_with_roles(u))
                    .collect();
                paginate(
                    rows,
                    query,
                    |r| vec![r.user.name.as_str(), r.user.email.as_str()],
                    |r| (r.user.created_at, r.user.id.into_uuid()),
                )
            })
            .await)
    }

    async fn create_user(&self, data: &CreateUser) -> AppResult<UserWithRoles> {
        self.write(|s| {
            if s.email_taken(&data.email, None) {
                return Err(AppError::conflict(format!(
                    "Email '{}' is already taken",
                    data.email
                )));
            }
            let now = Utc::now();
            let user = User {
                id: UserId::new(),
                name: data.name.clone(),
                email: data.email.clone(),
                password_hash: data.password_hash.clone(),
                created_at: now,
                updated_at: now,
            };
            s.users.insert(user.id, user.clone());
            s.sync_user_roles(user.id, &data.role_ids)?;
            Ok(s.user_with_roles(user))
        })
        .await
    }

    async fn update_user(&self, id: UserId, data: &UpdateUser) -> AppResult<UserWithRoles> {
        self.write(|s| {
            if s.email_taken(&data.email, Some(id)) {
                return Err(AppError::conflict(format!(
                    "Email '{}' is already taken",
                    data.email
                )));
            }
            let user = s
                .users
                .get_mut(&id)
                .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
            user.name = data.name.clone();
            user.email = data.email.clone();
            if let Some(hash) = &data.password_hash {
                user.password_hash = hash.clone();
            }
            user.updated_at = Utc::now();
            let user = user.clone();

            s.sync_user_roles(id, &data.role_ids)?;
            Ok(s.user_with_roles(user))
        })
        .await
    }

    async fn delete_user(&self, id: UserId) -> AppResult<()> {
        self.write(|s| {
            s.users
                .remove(&id)
                .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
            s.user_roles.retain(|(u, _)| *u != id);
            Ok(())
        })
        .await
    }

    async fn permission_names_for(&self, id: UserId) -> AppResult<Vec<String>> {
        Ok(self
            .read(|s| {
                let roles: BTreeSet<RoleId> = s
                    .user_roles
                    .iter()
                    .filter(|(u, _)| *u == id)
                    .map(|(_, r)| *r)
                    .collect();
                let names: BTreeSet<String> = s
                    .role_permissions
                    .iter()
                    .filter(|(r, _)| roles.contains(r))
                    .filter_map(|(_, p)| s.permissions.get(p))
                    .map(|p| p.name.clone())
                    .collect();
                names.into_iter().collect()
            })
            .await)
    }

    async fn count_users(&self) -> AppResult<u64> {
        Ok(self.read(|s| s.users.len() as u64).await)
    }

    async fn latest_users(&self, limit: u64) -> AppResult<Vec<User>> {
        Ok(self
            .read(|s| {
                let mut users: Vec<User> = s.users.values().cloned().collect();
                users.sort_by_key(|u| std::cmp::Reverse((u.created_at, u.id)));
                users.truncate(limit as usize);
                users
            })
            .await)
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn find_role(&self, id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.read(|s| s.roles.get(&id).cloned()).await)
    }

    async fn find_role_with_permissions(
        &self,
        id: RoleId,
    ) -> AppResult<Option<RoleWithPermissions>> {
        Ok(self
            .read(|s| s.roles.get(&id).cloned().map(|r| s.role_with_permissions(r)))
            .await)
    }

    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        Ok(self
            .read(|s| s.roles.values().find(|r| r.name == name).cloned())
            .await)
    }

    async fn search_roles(
        &self,
        query: &ListQuery,
    ) -> AppResult<PageResponse<RoleWithPermissions>> {
        Ok(self
            .read(|s| {
                let rows: Vec<RoleWithPermissions> = s
                    .roles
                    .values()
                    .cloned()
                    .map(|r| s.role_with_permissions(r))
                    .collect();
                paginate(
                    rows,
                    query,
                    |r| vec![r.role.name.as_str()],
                    |r| (r.role.created_at, r.role.id.into_uuid()),
                )
            })
            .await)
    }

    async fn all_roles(&self) -> AppResult<Vec<Role>> {
        Ok(self
            .read(|s| {
                let mut roles: Vec<Role> = s.roles.values().cloned().collect();
                roles.sort_by(|a, b| a.name.cmp(&b.name));
                roles
            })
            .await)
    }

    async fn create_role(&self, input: &RoleInput) -> AppResult<RoleWithPermissions> {
        self.write(|s| {
            if s.roles.values().any(|r| r.name == input.name) {
                return Err(AppError::conflict(format!(
                    "Role '{}' already exists",
                    input.name
                )));
            }
            let now = Utc::now();
            let role = Role {
                id: RoleId::new(),
                name: input.name.clone(),
                created_at: now,
                updated_at: now,
            };
            s.roles.insert(role.id, role.clone());
            s.sync_role_permissions(role.id, &input.permission_ids)?;
            Ok(s.role_with_permissions(role))
        })
        .await
    }

    async fn update_role(&self, id: RoleId, input: &RoleInput) -> AppResult<RoleWithPermissions> {
        self.write(|s| {
            if s.roles.values().any(|r| r.id != id && r.name == input.name) {
                return Err(AppError::conflict(format!(
                    "Role '{}' already exists",
                    input.name
                )));
            }
            let role = s
                .roles
                .get_mut(&id)
                .ok_or_else(|| AppError::not_found(format!("Role {id} not found")))?;
            role.name = input.name.clone();
            role.updated_at = Utc::now();
            let role = role.clone();

            s.sync_role_permissions(id, &input.permission_ids)?;
            Ok(s.role_with_permissions(role))
        })
        .await
    }

    async fn delete_role(&self, id: RoleId) -> AppResult<()> {
        self.write(|s| {
            s.roles
                .remove(&id)
                .ok_or_else(|| AppError::not_found(format!("Role {id} not found")))?;
            s.role_permissions.retain(|(r, _)| *r != id);
            s.user_roles.retain(|(_, r)| *r != id);
            Ok(())
        })
        .await
    }

    async fn count_roles(&self) -> AppResult<u64> {
        Ok(self.read(|s| s.roles.len() as u64).await)
    }

    async fn top_roles(&self, limit: u64) -> AppResult<Vec<RoleUsage>> {
        Ok(self
            .read(|s| {
                let mut usage: Vec<RoleUsage> = s
                    .roles
                    .values()
                    .map(|r| RoleUsage {
                        id: r.id,
                        name: r.name.clone(),
                        users_count: s.user_roles.iter().filter(|(_, rid)| *rid == r.id).count()
                            as i64,
                    })
                    .collect();
                usage.sort_by(|a, b| {
                    b.users_count
                        .cmp(&a.users_count)
                        .then_with(|| a.name.cmp(&b.name))
                });
                usage.truncate(limit as usize);
                usage
            })
            .await)
    }
}

#[async_trait]
impl PermissionStore for MemoryStore {
    async fn find_permission(&self, id: PermissionId) -> AppResult<Option<Permission>> {
        Ok(self.read(|s| s.permissions.get(&id).cloned()).await)
    }

    async fn find_permission_by_name(&self, name: &str) -> AppResult<Option<Permission>> {
        Ok(self
            .read(|s| s.permissions.values().find(|p| p.name == name).cloned())
            .await)
    }

    async fn search_permissions(&self, query: &ListQuery) -> AppResult<PageResponse<Permission>> {
        Ok(self
            .read(|s| {
                paginate(
                    s.permissions.values().cloned().collect(),
                    query,
                    |p| vec![p.name.as_str()],
                    |p| (p.created_at, p.id.into_uuid()),
                )
            })
            .await)
    }

    async fn all_permissions(&self) -> AppResult<Vec<Permission>> {
        Ok(self
            .read(|s| {
                let mut permissions: Vec<Permission> = s.permissions.values().cloned().collect();
                permissions.sort_by(|a, b| a.name.cmp(&b.name));
                permissions
            })
            .await)
    }

    async fn create_permission(&self, input: &PermissionInput) -> AppResult<Permission> {
        self.write(|s| {
            if s.permissions.values().any(|p| p.name == input.name) {
                return Err(AppError::conflict(format!(
                    "Permission '{}' already exists",
                    input.name
                )));
            }
            let now = Utc::now();
            let permission = Permission {
                id: PermissionId::new(),
                name: input.name.clone(),
                created_at: now,
                updated_at: now,
            };
            s.permissions.insert(permission.id, permission.clone());
            Ok(permission)
        })
        .await
    }

    async fn update_permission(
        &self,
        id: PermissionId,
        input: &PermissionInput,
    ) -> AppResult<Permission> {
        self.write(|s| {
            if s.permissions.values().any(|p| p.id != id && p.name == input.name) {
                return Err(AppError::conflict(format!(
                    "Permission '{}' already exists",
                    input.name
                )));
            }
            let permission = s
                .permissions
                .get_mut(&id)
                .ok_or_else(|| AppError::not_found(format!("Permission {id} not found")))?;
            permission.name = input.name.clone();
            permission.updated_at = Utc::now();
            Ok(permission.clone())
        })
        .await
    }

    async fn delete_permission(&self, id: PermissionId) -> AppResult<()> {
        self.write(|s| {
            s.permissions
                .remove(&id)
                .ok_or_else(|| AppError::not_found(format!("Permission {id} not found")))?;
            s.role_permissions.retain(|(_, p)| *p != id);
            Ok(())
        })
        .await
    }

    async fn count_permissions(&self) -> AppResult<u64> {
        Ok(self.read(|s| s.permissions.len() as u64).await)
    }

    async fn top_permissions(&self, limit: u64) -> AppResult<Vec<PermissionUsage>> {
        Ok(self
            .read(|s| {
                let mut usage: Vec<PermissionUsage> = s
                    .permissions
                    .values()
                    .map(|p| PermissionUsage {
                        id: p.id,
                        name: p.name.clone(),
                        roles_count: s
                            .role_permissions
                            .iter()
                            .filter(|(_, pid)| *pid == p.id)
                            .count() as i64,
                    })
                    .collect();
                usage.sort_by(|a, b| {
                    b.roles_count
                        .cmp(&a.roles_count)
                        .then_with(|| a.name.cmp(&b.name))
                });
                usage.truncate(limit as usize);
                usage
            })
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn permission(store: &MemoryStore, name: &str) -> Permission {
        store
            .create_permission(&PermissionInput { name: name.into() })
            .await
            .expect("create permission")
    }

    #[tokio::test]
    async fn test_role_sync_is_idempotent() {
        let store = MemoryStore::new();
        let a = permission(&store, "manage users").await;
        let b = permission(&store, "manage roles").await;

        let input = RoleInput {
            name: "editor".into(),
            permission_ids: vec![a.id],
        };
        let role = store.create_role(&input).await.expect("create role");

        let target = RoleInput {
            name: "editor".into(),
            permission_ids: vec![b.id, a.id],
        };
        let first = store.update_role(role.role.id, &target).await.expect("first");
        let second = store.update_role(role.role.id, &target).await.expect("second");

        assert_eq!(first.permission_names, vec!["manage roles", "manage users"]);
        assert_eq!(first.permission_ids, second.permission_ids);
    }

    #[tokio::test]
    async fn test_unknown_permission_rolls_back_rename() {
        let store = MemoryStore::new();
        let role = store
            .create_role(&RoleInput {
                name: "editor".into(),
                permission_ids: Vec::new(),
            })
            .await
            .expect("create role");

        let err = store
            .update_role(
                role.role.id,
                &RoleInput {
                    name: "writer".into(),
                    permission_ids: vec![PermissionId::new()],
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, backoffice_core::error::ErrorKind::Conflict);

        let stored = store.find_role(role.role.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "editor");
    }

    #[tokio::test]
    async fn test_injected_failure_leaves_state_untouched() {
        let store = MemoryStore::new();
        let p = permission(&store, "manage users").await;

        store.fail_writes(true);
        assert!(store.delete_permission(p.id).await.is_err());
        store.fail_writes(false);

        assert!(store.find_permission(p.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_role_delete_detaches_users() {
        let store = MemoryStore::new();
        let role = store
            .create_role(&RoleInput {
                name: "admin".into(),
                permission_ids: Vec::new(),
            })
            .await
            .unwrap();
        let user = store
            .create_user(&CreateUser {
                name: "Ann".into(),
                email: "ann@mail.com".into(),
                password_hash: "hash".into(),
                role_ids: vec![role.role.id],
            })
            .await
            .unwrap();
        assert_eq!(user.role_names, vec!["admin"]);

        store.delete_role(role.role.id).await.unwrap();
        let reloaded = store
            .find_user_with_roles(user.user.id)
            .await
            .unwrap()
            .unwrap();
        assert!(reloaded.role_ids.is_empty());
    }

    #[tokio::test]
    async fn test_email_unique_ignoring_case() {
        let store = MemoryStore::new();
        let data = CreateUser {
            name: "Ann".into(),
            email: "ann@mail.com".into(),
            password_hash: "hash".into(),
            role_ids: Vec::new(),
        };
        store.create_user(&data).await.unwrap();

        let dup = CreateUser {
            email: "ANN@mail.com".into(),
            ..data
        };
        assert!(store.create_user(&dup).await.is_err());
        assert_eq!(store.count_users().await.unwrap(), 1);
    }
}
