//! Meta tags, activity and audit entries for the in-memory store.

use std::sync::atomic::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use backoffice_core::error::AppError;
use backoffice_core::result::AppResult;
use backoffice_core::types::id::{ActivityId, AuditLogId, MetaTagId};
use backoffice_core::types::pagination::PageResponse;
use backoffice_core::types::query::ListQuery;
use backoffice_entity::activity::{CreateUserActivity, UserActivity};
use backoffice_entity::audit::{AuditLogEntry, AuditQuery, CreateAuditLogEntry};
use backoffice_entity::meta_tag::{MetaTag, MetaTagInput};

use super::{MemoryStore, State, paginate};
use crate::store::{ActivityStore, AuditStore, MetaTagStore};

impl State {
    fn page_taken(&self, page: &str, except: Option<MetaTagId>) -> bool {
        self.meta_tags
            .values()
            .any(|t| Some(t.id) != except && t.page == page)
    }
}

fn apply_input(tag: &mut MetaTag, input: &MetaTagInput) {
    tag.page = input.page.clone();
    tag.title = input.title.clone();
    tag.description = input.description.clone();
    tag.keywords = input.keywords.clone();
    tag.author = input.author.clone();
    tag.og_title = input.og_title.clone();
    tag.og_description = input.og_description.clone();
    tag.og_image = input.og_image.clone();
    tag.og_type = input.og_type_or_default();
    tag.twitter_card = input.twitter_card_or_default();
    tag.twitter_title = input.twitter_title.clone();
    tag.twitter_description = input.twitter_description.clone();
    tag.twitter_image = input.twitter_image.clone();
}

#[async_trait]
impl MetaTagStore for MemoryStore {
    async fn find_meta_tag(&self, id: MetaTagId) -> AppResult<Option<MetaTag>> {
        Ok(self.read(|s| s.meta_tags.get(&id).cloned()).await)
    }

    async fn find_meta_tag_by_page(&self, page: &str) -> AppResult<Option<MetaTag>> {
        Ok(self
            .read(|s| s.meta_tags.values().find(|t| t.page == page).cloned())
            .await)
    }

    async fn search_meta_tags(&self, query: &ListQuery) -> AppResult<PageResponse<MetaTag>> {
        Ok(self
            .read(|s| {
                paginate(
                    s.meta_tags.values().cloned().collect(),
                    query,
                    |t| {
                        let mut fields = vec![t.page.as_str()];
                        fields.extend(t.title.as_deref());
                        fields
                    },
                    |t| (t.created_at, t.id.into_uuid()),
                )
            })
            .await)
    }

    async fn create_meta_tag(&self, input: &MetaTagInput) -> AppResult<MetaTag> {
        self.write(|s| {
            if s.page_taken(&input.page, None) {
                return Err(AppError::conflict(format!(
                    "Meta tags for page '{}' already exist",
                    input.page
                )));
            }
            let now = Utc::now();
            let mut tag = MetaTag {
                id: MetaTagId::new(),
                page: String::new(),
                title: None,
                description: None,
                keywords: None,
                author: None,
                og_title: None,
                og_description: None,
                og_image: None,
                og_type: String::new(),
                twitter_card: String::new(),
                twitter_title: None,
                twitter_description: None,
                twitter_image: None,
                created_at: now,
                updated_at: now,
            };
            apply_input(&mut tag, input);
            s.meta_tags.insert(tag.id, tag.clone());
            Ok(tag)
        })
        .await
    }

    async fn update_meta_tag(&self, id: MetaTagId, input: &MetaTagInput) -> AppResult<MetaTag> {
        self.write(|s| {
            if s.page_taken(&input.page, Some(id)) {
                return Err(AppError::conflict(format!(
                    "Meta tags for page '{}' already exist",
                    input.page
                )));
            }
            let tag = s
                .meta_tags
                .get_mut(&id)
                .ok_or_else(|| AppError::not_found(format!("Meta tag {id} not found")))?;
            apply_input(tag, input);
            tag.updated_at = Utc::now();
            Ok(tag.clone())
        })
        .await
    }

    async fn delete_meta_tag(&self, id: MetaTagId) -> AppResult<()> {
        self.write(|s| {
            s.meta_tags
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| AppError::not_found(format!("Meta tag {id} not found")))
        })
        .await
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn append_activity(&self, data: &CreateUserActivity) -> AppResult<UserActivity> {
        let activity = UserActivity {
            id: ActivityId::new(),
            user_id: data.user_id,
            activity_type: data.activity_type,
            ip_address: data.ip_address.clone(),
            user_agent: data.user_agent.clone(),
            created_at: data.occurred_at,
        };
        self.state.lock().await.activities.push(activity.clone());
        Ok(activity)
    }

    async fn purge_activities(&self, before: Option<DateTime<Utc>>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let previous = state.activities.len();
        match before {
            Some(cutoff) => state.activities.retain(|a| a.created_at >= cutoff),
            None => state.activities.clear(),
        }
        Ok((previous - state.activities.len()) as u64)
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn append_audit(&self, data: &CreateAuditLogEntry) -> AppResult<AuditLogEntry> {
        if self.fail_audit.load(Ordering::SeqCst) {
            return Err(AppError::database("Audit storage unavailable"));
        }
        let entry = AuditLogEntry {
            id: AuditLogId::new(),
            actor_id: data.actor_id,
            action: data.action.clone(),
            target_type: data.target_type.clone(),
            target_id: data.target_id,
            outcome: data.outcome,
            details: data.details.clone(),
            ip_address: data.ip_address.clone(),
            user_agent: data.user_agent.clone(),
            created_at: Utc::now(),
        };
        self.state.lock().await.audit.push(entry.clone());
        Ok(entry)
    }

    async fn search_audit(&self, query: &AuditQuery) -> AppResult<PageResponse<AuditLogEntry>> {
        let list = ListQuery::new(None, query.page.clone());
        Ok(self
            .read(|s| {
                let rows: Vec<AuditLogEntry> =
                    s.audit.iter().filter(|e| query.matches(e)).cloned().collect();
                paginate(rows, &list, |_| Vec::new(), |e| (e.created_at, e.id.into_uuid()))
            })
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_core::types::id::UserId;
    use backoffice_entity::activity::ActivityType;
    use chrono::Duration;

    #[tokio::test]
    async fn test_meta_tag_defaults_applied() {
        let store = MemoryStore::new();
        let tag = store
            .create_meta_tag(&MetaTagInput::for_page("home"))
            .await
            .expect("create");
        assert_eq!(tag.og_type, "website");
        assert_eq!(tag.twitter_card, "summary_large_image");
    }

    #[tokio::test]
    async fn test_purge_before_cutoff_keeps_newer_rows() {
        let store = MemoryStore::new();
        let user_id = UserId::new();
        let now = Utc::now();
        for (offset, kind) in [(10, ActivityType::Login), (1, ActivityType::Logout)] {
            store
                .append_activity(&CreateUserActivity {
                    user_id,
                    activity_type: kind,
                    ip_address: Some("127.0.0.1".into()),
                    user_agent: None,
                    occurred_at: now - Duration::days(offset),
                })
                .await
                .unwrap();
        }

        let purged = store
            .purge_activities(Some(now - Duration::days(5)))
            .await
            .unwrap();
        assert_eq!(purged, 1);

        let remaining = store.activities().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].activity_type, ActivityType::Logout);
    }
}
