//! Permission repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use backoffice_core::error::{AppError, ErrorKind};
use backoffice_core::result::AppResult;
use backoffice_core::types::id::PermissionId;
use backoffice_core::types::pagination::PageResponse;
use backoffice_core::types::query::ListQuery;
use backoffice_entity::permission::{Permission, PermissionInput, PermissionUsage};

use super::unique_violation;
use crate::store::PermissionStore;

/// Repository for permissions.
#[derive(Debug, Clone)]
pub struct PermissionRepository {
    pool: PgPool,
}

impl PermissionRepository {
    /// Create a new permission repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn name_conflict(e: sqlx::Error, name: &str, context: &str) -> AppError {
    unique_violation(
        e,
        "permissions_name_key",
        format!("Permission '{name}' already exists"),
        context,
    )
}

#[async_trait]
impl PermissionStore for PermissionRepository {
    async fn find_permission(&self, id: PermissionId) -> AppResult<Option<Permission>> {
        sqlx::query_as::<_, Permission>("SELECT * FROM permissions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find permission by id", e)
            })
    }

    async fn find_permission_by_name(&self, name: &str) -> AppResult<Option<Permission>> {
        sqlx::query_as::<_, Permission>("SELECT * FROM permissions WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find permission by name", e)
            })
    }

    async fn search_permissions(&self, query: &ListQuery) -> AppResult<PageResponse<Permission>> {
        let pattern = query.like_pattern();
        let page = &query.page;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM permissions WHERE ($1::text IS NULL OR name ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count permissions", e))?;

        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT * FROM permissions \
             WHERE ($1::text IS NULL OR name ILIKE $1) \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(&pattern)
        .bind(page.sql_limit())
        .bind(page.sql_offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to search permissions", e)
        })?;

        Ok(PageResponse::new(
            permissions,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    async fn all_permissions(&self) -> AppResult<Vec<Permission>> {
        sqlx::query_as::<_, Permission>("SELECT * FROM permissions ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list permissions", e)
            })
    }

    async fn create_permission(&self, input: &PermissionInput) -> AppResult<Permission> {
        sqlx::query_as::<_, Permission>(
            "INSERT INTO permissions (id, name) VALUES ($1, $2) RETURNING *",
        )
        .bind(PermissionId::new())
        .bind(&input.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| name_conflict(e, &input.name, "Failed to create permission"))
    }

    async fn update_permission(
        &self,
        id: PermissionId,
        input: &PermissionInput,
    ) -> AppResult<Permission> {
        sqlx::query_as::<_, Permission>(
            "UPDATE permissions SET name = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&input.name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| name_conflict(e, &input.name, "Failed to update permission"))?
        .ok_or_else(|| AppError::not_found(format!("Permission {id} not found")))
    }

    async fn delete_permission(&self, id: PermissionId) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete permission", e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Permission {id} not found")));
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit permission deletion", e)
        })
    }

    async fn count_permissions(&self) -> AppResult<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM permissions")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count permissions", e)
            })?;
        Ok(total as u64)
    }

    async fn top_permissions(&self, limit: u64) -> AppResult<Vec<PermissionUsage>> {
        sqlx::query_as::<_, PermissionUsage>(
            "SELECT p.id, p.name, COUNT(rp.role_id) AS roles_count \
             FROM permissions p LEFT JOIN role_permissions rp ON rp.permission_id = p.id \
             GROUP BY p.id, p.name \
             ORDER BY roles_count DESC, p.name ASC \
             LIMIT $1",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rank permissions", e))
    }
}
