//! Meta tag repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use backoffice_core::error::{AppError, ErrorKind};
use backoffice_core::result::AppResult;
use backoffice_core::types::id::MetaTagId;
use backoffice_core::types::pagination::PageResponse;
use backoffice_core::types::query::ListQuery;
use backoffice_entity::meta_tag::{MetaTag, MetaTagInput};

use super::unique_violation;
use crate::store::MetaTagStore;

/// Repository for page meta tags.
#[derive(Debug, Clone)]
pub struct MetaTagRepository {
    pool: PgPool,
}

impl MetaTagRepository {
    /// Create a new meta tag repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn page_conflict(e: sqlx::Error, page: &str, context: &str) -> AppError {
    unique_violation(
        e,
        "meta_tags_page_key",
        format!("Meta tags for page '{page}' already exist"),
        context,
    )
}

#[async_trait]
impl MetaTagStore for MetaTagRepository {
    async fn find_meta_tag(&self, id: MetaTagId) -> AppResult<Option<MetaTag>> {
        sqlx::query_as::<_, MetaTag>("SELECT * FROM meta_tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find meta tag", e))
    }

    async fn find_meta_tag_by_page(&self, page: &str) -> AppResult<Option<MetaTag>> {
        sqlx::query_as::<_, MetaTag>("SELECT * FROM meta_tags WHERE page = $1")
            .bind(page)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find meta tag by page", e)
            })
    }

    async fn search_meta_tags(&self, query: &ListQuery) -> AppResult<PageResponse<MetaTag>> {
        let pattern = query.like_pattern();
        let page = &query.page;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM meta_tags \
             WHERE ($1::text IS NULL OR page ILIKE $1 OR title ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count meta tags", e))?;

        let tags = sqlx::query_as::<_, MetaTag>(
            "SELECT * FROM meta_tags \
             WHERE ($1::text IS NULL OR page ILIKE $1 OR title ILIKE $1) \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(&pattern)
        .bind(page.sql_limit())
        .bind(page.sql_offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to search meta tags", e))?;

        Ok(PageResponse::new(tags, page.page, page.page_size, total as u64))
    }

    async fn create_meta_tag(&self, input: &MetaTagInput) -> AppResult<MetaTag> {
        sqlx::query_as::<_, MetaTag>(
            "INSERT INTO meta_tags (\
                id, page, title, description, keywords, author, \
                og_title, og_description, og_image, og_type, \
                twitter_card, twitter_title, twitter_description, twitter_image\
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING *",
        )
        .bind(MetaTagId::new())
        .bind(&input.page)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.keywords)
        .bind(&input.author)
        .bind(&input.og_title)
        .bind(&input.og_description)
        .bind(&input.og_image)
        .bind(input.og_type_or_default())
        .bind(input.twitter_card_or_default())
        .bind(&input.twitter_title)
        .bind(&input.twitter_description)
        .bind(&input.twitter_image)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| page_conflict(e, &input.page, "Failed to create meta tag"))
    }

    async fn update_meta_tag(&self, id: MetaTagId, input: &MetaTagInput) -> AppResult<MetaTag> {
        sqlx::query_as::<_, MetaTag>(
            "UPDATE meta_tags SET \
                page = $2, title = $3, description = $4, keywords = $5, author = $6, \
                og_title = $7, og_description = $8, og_image = $9, og_type = $10, \
                twitter_card = $11, twitter_title = $12, twitter_description = $13, \
                twitter_image = $14, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING *",
        )
        .bind(id)
        .bind(&input.page)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.keywords)
        .bind(&input.author)
        .bind(&input.og_title)
        .bind(&input.og_description)
        .bind(&input.og_image)
        .bind(input.og_type_or_default())
        .bind(input.twitter_card_or_default())
        .bind(&input.twitter_title)
        .bind(&input.twitter_description)
        .bind(&input.twitter_image)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| page_conflict(e, &input.page, "Failed to update meta tag"))?
        .ok_or_else(|| AppError::not_found(format!("Meta tag {id} not found")))
    }

    async fn delete_meta_tag(&self, id: MetaTagId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM meta_tags WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete meta tag", e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Meta tag {id} not found")));
        }
        Ok(())
    }
}
