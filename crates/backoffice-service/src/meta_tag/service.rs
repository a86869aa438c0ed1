//! Meta tag CRUD. Available to every authenticated administrator.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, error, info, warn};
use validator::Validate;

use backoffice_auth::{DeletionTarget, PolicyDecision, ProtectedEntityPolicy};
use backoffice_core::error::AppError;
use backoffice_core::result::AppResult;
use backoffice_core::types::id::MetaTagId;
use backoffice_core::types::notification::Notification;
use backoffice_core::types::pagination::{PageRequest, PageResponse};
use backoffice_core::types::query::ListQuery;
use backoffice_database::MetaTagStore;
use backoffice_entity::meta_tag::{MetaTag, MetaTagInput, PageMeta};

use crate::audit::{AuditLogger, AuditTarget, AuditVerb};
use crate::context::RequestContext;
use crate::outcome::ActionOutcome;
use crate::validation::FieldErrors;

const PAGE_TAKEN: &str = "The page has already been taken.";

/// Manages per-page SEO and social meta tags.
#[derive(Clone)]
pub struct MetaTagService {
    meta_tags: Arc<dyn MetaTagStore>,
    policy: ProtectedEntityPolicy,
    audit: AuditLogger,
    page_size: u64,
}

impl std::fmt::Debug for MetaTagService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetaTagService")
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

fn snapshot(tag: &MetaTag) -> Value {
    let mut value = serde_json::to_value(PageMeta::from(tag.clone())).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut value {
        map.insert("page".into(), Value::String(tag.page.clone()));
    }
    value
}

impl MetaTagService {
    /// Creates a new meta tag service.
    pub fn new(meta_tags: Arc<dyn MetaTagStore>, audit: AuditLogger, page_size: u64) -> Self {
        Self {
            meta_tags,
            policy: ProtectedEntityPolicy::new(),
            audit,
            page_size,
        }
    }

    /// Searches page keys and titles, newest first.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        search: Option<String>,
        page: u64,
    ) -> AppResult<PageResponse<MetaTag>> {
        let query = ListQuery::new(search, PageRequest::new(page, self.page_size));
        debug!(admin_id = %ctx.user_id, search = ?query.term(), page, "Listing meta tags");
        self.meta_tags.search_meta_tags(&query).await
    }

    /// Loads a meta tag for editing.
    pub async fn get(&self, _ctx: &RequestContext, id: MetaTagId) -> AppResult<MetaTag> {
        self.find(id).await
    }

    async fn find(&self, id: MetaTagId) -> AppResult<MetaTag> {
        self.meta_tags
            .find_meta_tag(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Meta tag {id} not found")))
    }

    async fn validate(
        &self,
        input: &MetaTagInput,
        except: Option<MetaTagId>,
    ) -> AppResult<FieldErrors> {
        let mut errors = FieldErrors::from_result(input.validate());
        if !errors.has("page") {
            let taken = self
                .meta_tags
                .find_meta_tag_by_page(&input.page)
                .await?
                .is_some_and(|other| Some(other.id) != except);
            if taken {
                errors.add("page", PAGE_TAKEN);
            }
        }
        Ok(errors)
    }

    /// Creates meta tags for a page.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        input: MetaTagInput,
    ) -> AppResult<ActionOutcome<MetaTag>> {
        let input = input.normalized();
        let errors = self.validate(&input, None).await?;
        if !errors.is_empty() {
            return Ok(ActionOutcome::Invalid { errors });
        }

        match self.meta_tags.create_meta_tag(&input).await {
            Ok(tag) => {
                info!(admin_id = %ctx.user_id, meta_tag_id = %tag.id, page = %tag.page, "Meta tag created");
                self.audit
                    .success(
                        Some(ctx),
                        AuditTarget::MetaTag,
                        AuditVerb::Create,
                        Some(tag.id.into_uuid()),
                        json!({ "after": snapshot(&tag) }),
                    )
                    .await;
                Ok(ActionOutcome::success(
                    tag,
                    Notification::success("Meta tag created successfully."),
                ))
            }
            Err(e) => {
                error!(admin_id = %ctx.user_id, page = %input.page, error = %e, "Failed to create meta tag");
                self.audit
                    .failed(
                        ctx,
                        AuditTarget::MetaTag,
                        AuditVerb::Create,
                        None,
                        json!({ "page": input.page, "error": e.to_string() }),
                    )
                    .await;
                Ok(ActionOutcome::failed("Failed to save meta tag."))
            }
        }
    }

    /// Overwrites every field of a meta tag. Unset `og_type` and
    /// `twitter_card` fall back to their defaults.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: MetaTagId,
        input: MetaTagInput,
    ) -> AppResult<ActionOutcome<MetaTag>> {
        let before = self.find(id).await?;
        let input = input.normalized();
        let errors = self.validate(&input, Some(id)).await?;
        if !errors.is_empty() {
            return Ok(ActionOutcome::Invalid { errors });
        }

        match self.meta_tags.update_meta_tag(id, &input).await {
            Ok(after) => {
                info!(admin_id = %ctx.user_id, meta_tag_id = %id, page = %after.page, "Meta tag updated");
                self.audit
                    .success(
                        Some(ctx),
                        AuditTarget::MetaTag,
                        AuditVerb::Update,
                        Some(id.into_uuid()),
                        json!({ "before": snapshot(&before), "after": snapshot(&after) }),
                    )
                    .await;
                Ok(ActionOutcome::success(
                    after,
                    Notification::success("Meta tag updated successfully."),
                ))
            }
            Err(e) => {
                error!(admin_id = %ctx.user_id, meta_tag_id = %id, error = %e, "Failed to update meta tag");
                self.audit
                    .failed(
                        ctx,
                        AuditTarget::MetaTag,
                        AuditVerb::Update,
                        Some(id.into_uuid()),
                        json!({ "before": snapshot(&before), "error": e.to_string() }),
                    )
                    .await;
                Ok(ActionOutcome::failed("Failed to save meta tag."))
            }
        }
    }

    /// Deletes a meta tag.
    pub async fn delete(&self, ctx: &RequestContext, id: MetaTagId) -> AppResult<ActionOutcome<()>> {
        let tag = self.find(id).await?;

        if let PolicyDecision::Deny(reason) = self
            .policy
            .can_delete(DeletionTarget::MetaTag(&tag), ctx.user_id)
        {
            warn!(admin_id = %ctx.user_id, meta_tag_id = %id, %reason, "Meta tag deletion refused");
            self.audit
                .rejected(
                    ctx,
                    AuditTarget::MetaTag,
                    AuditVerb::Delete,
                    id.into_uuid(),
                    json!({ "reason": reason, "page": tag.page }),
                )
                .await;
            return Ok(ActionOutcome::rejected(reason, reason.notice()));
        }

        match self.meta_tags.delete_meta_tag(id).await {
            Ok(()) => {
                info!(admin_id = %ctx.user_id, meta_tag_id = %id, page = %tag.page, "Meta tag deleted");
                self.audit
                    .success(
                        Some(ctx),
                        AuditTarget::MetaTag,
                        AuditVerb::Delete,
                        Some(id.into_uuid()),
                        json!({ "before": snapshot(&tag) }),
                    )
                    .await;
                Ok(ActionOutcome::success(
                    (),
                    Notification::success("Meta Tag deleted successfully."),
                ))
            }
            Err(e) => {
                error!(admin_id = %ctx.user_id, meta_tag_id = %id, error = %e, "Failed to delete meta tag");
                self.audit
                    .failed(
                        ctx,
                        AuditTarget::MetaTag,
                        AuditVerb::Delete,
                        Some(id.into_uuid()),
                        json!({ "page": tag.page, "error": e.to_string() }),
                    )
                    .await;
                Ok(ActionOutcome::failed("Failed to delete meta tag."))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use backoffice_core::types::id::UserId;
    use backoffice_database::MemoryStore;

    fn service(store: &MemoryStore) -> MetaTagService {
        MetaTagService::new(Arc::new(store.clone()), testing::audit(store), 10)
    }

    #[tokio::test]
    async fn test_home_without_og_type_stores_default() {
        let store = MemoryStore::new();
        // No management permission needed for meta tags.
        let ctx = testing::ctx_with(UserId::new(), Vec::new());

        let outcome = service(&store)
            .create(&ctx, MetaTagInput::for_page("home"))
            .await
            .unwrap();

        let tag = outcome.into_value().unwrap();
        assert_eq!(tag.og_type, "website");
        assert_eq!(tag.twitter_card, "summary_large_image");
    }

    #[tokio::test]
    async fn test_duplicate_page_is_invalid() {
        let store = MemoryStore::new();
        let service = service(&store);
        let ctx = testing::admin_ctx();
        service
            .create(&ctx, MetaTagInput::for_page("about"))
            .await
            .unwrap();

        let outcome = service
            .create(&ctx, MetaTagInput::for_page("about"))
            .await
            .unwrap();
        assert_eq!(outcome.field_errors().unwrap().get("page"), [PAGE_TAKEN]);
    }

    #[tokio::test]
    async fn test_update_same_values_then_search() {
        let store = MemoryStore::new();
        let service = service(&store);
        let ctx = testing::admin_ctx();
        let input = MetaTagInput {
            title: Some("About us".into()),
            ..MetaTagInput::for_page("about")
        };
        let created = service
            .create(&ctx, input.clone())
            .await
            .unwrap()
            .into_value()
            .unwrap();

        let updated = service
            .update(&ctx, created.id, input)
            .await
            .unwrap()
            .into_value()
            .unwrap();
        assert_eq!(updated.title, created.title);

        let page = service.list(&ctx, Some("about".into()), 1).await.unwrap();
        assert_eq!(page.total_items, 1);
        assert_eq!(page.items[0].id, created.id);
        assert_eq!(page.items[0].title.as_deref(), Some("About us"));
    }

    #[tokio::test]
    async fn test_delete_notification() {
        let store = MemoryStore::new();
        let service = service(&store);
        let ctx = testing::admin_ctx();
        let tag = service
            .create(&ctx, MetaTagInput::for_page("contact"))
            .await
            .unwrap()
            .into_value()
            .unwrap();

        let outcome = service.delete(&ctx, tag.id).await.unwrap();
        assert_eq!(
            outcome.notification().unwrap().message,
            "Meta Tag deleted successfully."
        );
        assert!(store.find_meta_tag(tag.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_listing_pages_newest_first_and_searches_case_insensitively() {
        let store = MemoryStore::new();
        let service = service(&store);
        let ctx = testing::admin_ctx();
        for i in 0..11 {
            let input = MetaTagInput {
                title: Some(if i % 4 == 0 { format!("Landing {i}") } else { format!("Page {i}") }),
                ..MetaTagInput::for_page(format!("page-{i:02}"))
            };
            assert!(service.create(&ctx, input).await.unwrap().is_success());
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let first = service.list(&ctx, None, 1).await.unwrap();
        assert_eq!(first.total_items, 11);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.items[0].page, "page-10");
        assert_eq!(first.items[9].page, "page-01");

        let second = service.list(&ctx, None, 2).await.unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].page, "page-00");

        let found = service.list(&ctx, Some("LANDING".into()), 1).await.unwrap();
        let pages: Vec<&str> = found.items.iter().map(|t| t.page.as_str()).collect();
        assert_eq!(pages, ["page-08", "page-04", "page-00"]);
        assert_eq!(found.total_pages, 1);
    }

    #[tokio::test]
    async fn test_listing_far_past_the_end_is_empty() {
        let store = MemoryStore::new();
        let service = service(&store);
        let ctx = testing::admin_ctx();
        service
            .create(&ctx, MetaTagInput::for_page("home"))
            .await
            .unwrap();

        let page = service.list(&ctx, None, u64::MAX).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 1);
        assert!(!page.has_next);
    }
}
