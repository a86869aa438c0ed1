//! User activity repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;

use backoffice_core::error::{AppError, ErrorKind};
use backoffice_core::result::AppResult;
use backoffice_core::types::id::ActivityId;
use backoffice_entity::activity::{CreateUserActivity, UserActivity};

use crate::store::ActivityStore;

/// Repository for the append-only `user_activities` table.
#[derive(Debug, Clone)]
pub struct ActivityRepository {
    pool: PgPool,
}

impl ActivityRepository {
    /// Create a new activity repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityStore for ActivityRepository {
    async fn append_activity(&self, data: &CreateUserActivity) -> AppResult<UserActivity> {
        sqlx::query_as::<_, UserActivity>(
            "INSERT INTO user_activities (id, user_id, activity_type, ip_address, user_agent, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING *",
        )
        .bind(ActivityId::new())
        .bind(data.user_id)
        .bind(data.activity_type)
        .bind(&data.ip_address)
        .bind(&data.user_agent)
        .bind(data.occurred_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record activity", e))
    }

    async fn purge_activities(&self, before: Option<DateTime<Utc>>) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM user_activities WHERE ($1::timestamptz IS NULL OR created_at < $1)",
        )
        .bind(before)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to purge activities", e))?;

        let purged = result.rows_affected();
        info!(purged, before = ?before, "User activities purged");
        Ok(purged)
    }
}
