//! Audit log repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use backoffice_core::error::{AppError, ErrorKind};
use backoffice_core::result::AppResult;
use backoffice_core::types::id::AuditLogId;
use backoffice_core::types::pagination::PageResponse;
use backoffice_entity::audit::{AuditLogEntry, AuditQuery, CreateAuditLogEntry};

use crate::store::AuditStore;

/// Repository for the append-only `audit_log` table.
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    pool: PgPool,
}

impl AuditLogRepository {
    /// Create a new audit log repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStore for AuditLogRepository {
    async fn append_audit(&self, data: &CreateAuditLogEntry) -> AppResult<AuditLogEntry> {
        sqlx::query_as::<_, AuditLogEntry>(
            "INSERT INTO audit_log \
                (id, actor_id, action, target_type, target_id, outcome, details, ip_address, user_agent) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING *",
        )
        .bind(AuditLogId::new())
        .bind(data.actor_id)
        .bind(&data.action)
        .bind(&data.target_type)
        .bind(data.target_id)
        .bind(data.outcome)
        .bind(&data.details)
        .bind(&data.ip_address)
        .bind(&data.user_agent)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to write audit entry", e))
    }

    async fn search_audit(&self, query: &AuditQuery) -> AppResult<PageResponse<AuditLogEntry>> {
        let page = &query.page;
        let filter = "WHERE ($1::uuid IS NULL OR actor_id = $1) \
                        AND ($2::text IS NULL OR target_type = $2) \
                        AND ($3::text IS NULL OR action = $3)";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM audit_log {filter}"))
            .bind(query.actor_id)
            .bind(&query.target_type)
            .bind(&query.action)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count audit entries", e)
            })?;

        let entries = sqlx::query_as::<_, AuditLogEntry>(&format!(
            "SELECT * FROM audit_log {filter} \
             ORDER BY created_at DESC, id DESC LIMIT $4 OFFSET $5"
        ))
        .bind(query.actor_id)
        .bind(&query.target_type)
        .bind(&query.action)
        .bind(page.sql_limit())
        .bind(page.sql_offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to search audit log", e))?;

        Ok(PageResponse::new(
            entries,
            page.page,
            page.page_size,
            total as u64,
        ))
    }
}
