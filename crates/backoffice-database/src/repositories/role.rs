//! Role repository implementation.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

use backoffice_core::error::{AppError, ErrorKind};
use backoffice_core::result::AppResult;
use backoffice_core::types::id::{PermissionId, RoleId};
use backoffice_core::types::pagination::PageResponse;
use backoffice_core::types::query::ListQuery;
use backoffice_entity::role::{Role, RoleInput, RoleUsage, RoleWithPermissions};

use super::{raw_ids, unique_violation};
use crate::store::RoleStore;
use crate::sync::{SyncPlan, plan_sync};

#[derive(Debug, FromRow)]
struct RolePermissionRow {
    role_id: RoleId,
    permission_id: PermissionId,
    name: String,
}

/// Repository for roles and the `role_permissions` association.
#[derive(Debug, Clone)]
pub struct RoleRepository {
    pool: PgPool,
}

impl RoleRepository {
    /// Create a new role repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn with_permissions(
        conn: &mut PgConnection,
        roles: Vec<Role>,
    ) -> AppResult<Vec<RoleWithPermissions>> {
        let ids: Vec<Uuid> = roles.iter().map(|r| r.id.into_uuid()).collect();
        let rows = sqlx::query_as::<_, RolePermissionRow>(
            "SELECT rp.role_id, p.id AS permission_id, p.name \
             FROM role_permissions rp JOIN permissions p ON p.id = rp.permission_id \
             WHERE rp.role_id = ANY($1) \
             ORDER BY p.name",
        )
        .bind(&ids)
        .fetch_all(conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load role permissions", e)
        })?;

        let mut by_role: HashMap<RoleId, Vec<RolePermissionRow>> = HashMap::new();
        for row in rows {
            by_role.entry(row.role_id).or_default().push(row);
        }

        Ok(roles
            .into_iter()
            .map(|role| {
                let rows = by_role.remove(&role.id).unwrap_or_default();
                RoleWithPermissions {
                    role,
                    permission_ids: rows.iter().map(|r| r.permission_id).collect(),
                    permission_names: rows.into_iter().map(|r| r.name).collect(),
                }
            })
            .collect())
    }

    /// Replace the permission set of `role_id` with `permission_ids`.
    ///
    /// Fails with a conflict when any id does not name an existing
    /// permission, which aborts the surrounding transaction.
    async fn sync_permissions(
        conn: &mut PgConnection,
        role_id: RoleId,
        permission_ids: &[PermissionId],
    ) -> AppResult<SyncPlan<Uuid>> {
        let target = raw_ids(permission_ids);
        let wanted: BTreeSet<Uuid> = target.iter().copied().collect();

        let found: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM permissions WHERE id = ANY($1)")
            .bind(&target)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to check permissions", e)
            })?;
        if found as usize != wanted.len() {
            return Err(AppError::conflict(
                "One or more selected permissions do not exist",
            ));
        }

        let current: Vec<Uuid> =
            sqlx::query_scalar("SELECT permission_id FROM role_permissions WHERE role_id = $1")
                .bind(role_id)
                .fetch_all(&mut *conn)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to load role permissions", e)
                })?;

        let plan = plan_sync(&current, &target);

        if !plan.detach.is_empty() {
            sqlx::query(
                "DELETE FROM role_permissions WHERE role_id = $1 AND permission_id = ANY($2)",
            )
            .bind(role_id)
            .bind(&plan.detach)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to revoke permissions", e)
            })?;
        }

        if !plan.attach.is_empty() {
            sqlx::query(
                "INSERT INTO role_permissions (role_id, permission_id) \
                 SELECT $1, UNNEST($2::uuid[])",
            )
            .bind(role_id)
            .bind(&plan.attach)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to grant permissions", e)
            })?;
        }

        debug!(
            role_id = %role_id,
            granted = plan.attach.len(),
            revoked = plan.detach.len(),
            "Role permissions synchronised"
        );
        Ok(plan)
    }

    async fn begin(&self) -> AppResult<sqlx::Transaction<'static, sqlx::Postgres>> {
        self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })
    }

    async fn acquire(&self) -> AppResult<sqlx::pool::PoolConnection<sqlx::Postgres>> {
        self.pool.acquire().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to acquire connection", e)
        })
    }
}

fn name_conflict(e: sqlx::Error, name: &str, context: &str) -> AppError {
    unique_violation(
        e,
        "roles_name_key",
        format!("Role '{name}' already exists"),
        context,
    )
}

#[async_trait]
impl RoleStore for RoleRepository {
    async fn find_role(&self, id: RoleId) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find role by id", e))
    }

    async fn find_role_with_permissions(
        &self,
        id: RoleId,
    ) -> AppResult<Option<RoleWithPermissions>> {
        let Some(role) = self.find_role(id).await? else {
            return Ok(None);
        };
        let mut conn = self.acquire().await?;
        Ok(Self::with_permissions(&mut conn, vec![role]).await?.pop())
    }

    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find role by name", e)
            })
    }

    async fn search_roles(
        &self,
        query: &ListQuery,
    ) -> AppResult<PageResponse<RoleWithPermissions>> {
        let pattern = query.like_pattern();
        let page = &query.page;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM roles WHERE ($1::text IS NULL OR name ILIKE $1)")
                .bind(&pattern)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count roles", e)
                })?;

        let roles = sqlx::query_as::<_, Role>(
            "SELECT * FROM roles \
             WHERE ($1::text IS NULL OR name ILIKE $1) \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(&pattern)
        .bind(page.sql_limit())
        .bind(page.sql_offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to search roles", e))?;

        let mut conn = self.acquire().await?;
        let items = Self::with_permissions(&mut conn, roles).await?;

        Ok(PageResponse::new(
            items,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    async fn all_roles(&self) -> AppResult<Vec<Role>> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list roles", e))
    }

    async fn create_role(&self, input: &RoleInput) -> AppResult<RoleWithPermissions> {
        let mut tx = self.begin().await?;

        let role = sqlx::query_as::<_, Role>(
            "INSERT INTO roles (id, name) VALUES ($1, $2) RETURNING *",
        )
        .bind(RoleId::new())
        .bind(&input.name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| name_conflict(e, &input.name, "Failed to create role"))?;

        Self::sync_permissions(&mut tx, role.id, &input.permission_ids).await?;
        let created = Self::with_permissions(&mut tx, vec![role]).await?.pop();

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit role creation", e)
        })?;

        created.ok_or_else(|| AppError::internal("Created role vanished inside its transaction"))
    }

    async fn update_role(&self, id: RoleId, input: &RoleInput) -> AppResult<RoleWithPermissions> {
        let mut tx = self.begin().await?;

        let role = sqlx::query_as::<_, Role>(
            "UPDATE roles SET name = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&input.name)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| name_conflict(e, &input.name, "Failed to update role"))?
        .ok_or_else(|| AppError::not_found(format!("Role {id} not found")))?;

        Self::sync_permissions(&mut tx, id, &input.permission_ids).await?;
        let updated = Self::with_permissions(&mut tx, vec![role]).await?.pop();

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit role update", e)
        })?;

        updated.ok_or_else(|| AppError::internal("Updated role vanished inside its transaction"))
    }

    async fn delete_role(&self, id: RoleId) -> AppResult<()> {
        let mut tx = self.begin().await?;

        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete role", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Role {id} not found")));
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit role deletion", e)
        })
    }

    async fn count_roles(&self) -> AppResult<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count roles", e))?;
        Ok(total as u64)
    }

    async fn top_roles(&self, limit: u64) -> AppResult<Vec<RoleUsage>> {
        sqlx::query_as::<_, RoleUsage>(
            "SELECT r.id, r.name, COUNT(ur.user_id) AS users_count \
             FROM roles r LEFT JOIN user_roles ur ON ur.role_id = r.id \
             GROUP BY r.id, r.name \
             ORDER BY users_count DESC, r.name ASC \
             LIMIT $1",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rank roles", e))
    }
}
