//! User repository implementation.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

use backoffice_core::error::{AppError, ErrorKind};
use backoffice_core::result::AppResult;
use backoffice_core::types::id::{RoleId, UserId};
use backoffice_core::types::pagination::PageResponse;
use backoffice_core::types::query::ListQuery;
use backoffice_entity::user::{CreateUser, UpdateUser, User, UserWithRoles};

use super::{raw_ids, unique_violation};
use crate::store::UserStore;
use crate::sync::{SyncPlan, plan_sync};

/// One (user, role) pair joined with the role name.
#[derive(Debug, FromRow)]
struct UserRoleRow {
    user_id: UserId,
    role_id: RoleId,
    name: String,
}

/// Repository for users and the `user_roles` association.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn role_rows(conn: &mut PgConnection, user_ids: &[Uuid]) -> AppResult<Vec<UserRoleRow>> {
        sqlx::query_as::<_, UserRoleRow>(
            "SELECT ur.user_id, r.id AS role_id, r.name \
             FROM user_roles ur JOIN roles r ON r.id = ur.role_id \
             WHERE ur.user_id = ANY($1) \
             ORDER BY r.name",
        )
        .bind(user_ids)
        .fetch_all(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load user roles", e))
    }

    async fn with_roles(conn: &mut PgConnection, users: Vec<User>) -> AppResult<Vec<UserWithRoles>> {
        let ids: Vec<Uuid> = users.iter().map(|u| u.id.into_uuid()).collect();
        let mut by_user: HashMap<UserId, Vec<UserRoleRow>> = HashMap::new();
        for row in Self::role_rows(conn, &ids).await? {
            by_user.entry(row.user_id).or_default().push(row);
        }

        Ok(users
            .into_iter()
            .map(|user| {
                let rows = by_user.remove(&user.id).unwrap_or_default();
                UserWithRoles {
                    user,
                    role_ids: rows.iter().map(|r| r.role_id).collect(),
                    role_names: rows.into_iter().map(|r| r.name).collect(),
                }
            })
            .collect())
    }

    /// Replace the role set of `user_id` with `role_ids`.
    ///
    /// Fails with a conflict when any id does not name an existing role,
    /// which aborts the surrounding transaction.
    async fn sync_roles(
        conn: &mut PgConnection,
        user_id: UserId,
        role_ids: &[RoleId],
    ) -> AppResult<SyncPlan<Uuid>> {
        let target = raw_ids(role_ids);
        let wanted: BTreeSet<Uuid> = target.iter().copied().collect();

        let found: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles WHERE id = ANY($1)")
            .bind(&target)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check roles", e))?;
        if found as usize != wanted.len() {
            return Err(AppError::conflict("One or more selected roles do not exist"));
        }

        let current: Vec<Uuid> =
            sqlx::query_scalar("SELECT role_id FROM user_roles WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&mut *conn)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to load user roles", e)
                })?;

        let plan = plan_sync(&current, &target);

        if !plan.detach.is_empty() {
            sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = ANY($2)")
                .bind(user_id)
                .bind(&plan.detach)
                .execute(&mut *conn)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to detach user roles", e)
                })?;
        }

        if !plan.attach.is_empty() {
            sqlx::query(
                "INSERT INTO user_roles (user_id, role_id) SELECT $1, UNNEST($2::uuid[])",
            )
            .bind(user_id)
            .bind(&plan.attach)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to attach user roles", e)
            })?;
        }

        debug!(
            user_id = %user_id,
            attached = plan.attach.len(),
            detached = plan.detach.len(),
            "User roles synchronised"
        );
        Ok(plan)
    }

    async fn begin(&self) -> AppResult<sqlx::Transaction<'static, sqlx::Postgres>> {
        self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })
    }
}

fn email_conflict(e: sqlx::Error, email: &str, context: &str) -> AppError {
    unique_violation(
        e,
        "users_email_key",
        format!("Email '{email}' is already taken"),
        context,
    )
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_user(&self, id: UserId) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))
    }

    async fn find_user_with_roles(&self, id: UserId) -> AppResult<Option<UserWithRoles>> {
        let Some(user) = self.find_user(id).await? else {
            return Ok(None);
        };
        let mut conn = self.pool.acquire().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to acquire connection", e)
        })?;
        Ok(Self::with_roles(&mut conn, vec![user]).await?.pop())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by email", e)
            })
    }

    async fn search_users(&self, query: &ListQuery) -> AppResult<PageResponse<UserWithRoles>> {
        let pattern = query.like_pattern();
        let page = &query.page;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users \
             WHERE ($1::text IS NULL OR name ILIKE $1 OR email ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count users", e))?;

        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users \
             WHERE ($1::text IS NULL OR name ILIKE $1 OR email ILIKE $1) \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(&pattern)
        .bind(page.sql_limit())
        .bind(page.sql_offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to search users", e))?;

        let mut conn = self.pool.acquire().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to acquire connection", e)
        })?;
        let items = Self::with_roles(&mut conn, users).await?;

        Ok(PageResponse::new(
            items,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    async fn create_user(&self, data: &CreateUser) -> AppResult<UserWithRoles> {
        let mut tx = self.begin().await?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, name, email, password_hash) \
             VALUES ($1, $2, $3, $4) \
             RETURNING *",
        )
        .bind(UserId::new())
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| email_conflict(e, &data.email, "Failed to create user"))?;

        Self::sync_roles(&mut tx, user.id, &data.role_ids).await?;
        let created = Self::with_roles(&mut tx, vec![user]).await?.pop();

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit user creation", e)
        })?;

        created.ok_or_else(|| AppError::internal("Created user vanished inside its transaction"))
    }

    async fn update_user(&self, id: UserId, data: &UpdateUser) -> AppResult<UserWithRoles> {
        let mut tx = self.begin().await?;

        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET \
                name = $2, \
                email = $3, \
                password_hash = COALESCE($4, password_hash), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING *",
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.password_hash)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| email_conflict(e, &data.email, "Failed to update user"))?
        .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;

        Self::sync_roles(&mut tx, id, &data.role_ids).await?;
        let updated = Self::with_roles(&mut tx, vec![user]).await?.pop();

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit user update", e)
        })?;

        updated.ok_or_else(|| AppError::internal("Updated user vanished inside its transaction"))
    }

    async fn delete_user(&self, id: UserId) -> AppResult<()> {
        let mut tx = self.begin().await?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete user", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {id} not found")));
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit user deletion", e)
        })
    }

    async fn permission_names_for(&self, id: UserId) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT p.name FROM permissions p \
             JOIN role_permissions rp ON rp.permission_id = p.id \
             JOIN user_roles ur ON ur.role_id = rp.role_id \
             WHERE ur.user_id = $1 \
             ORDER BY p.name",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load user permissions", e)
        })
    }

    async fn count_users(&self) -> AppResult<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count users", e))?;
        Ok(total as u64)
    }

    async fn latest_users(&self, limit: u64) -> AppResult<Vec<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC, id DESC LIMIT $1")
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to load latest users", e)
            })
    }
}
