//! Resolves the meta tags to render for a request path.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use backoffice_core::result::AppResult;
use backoffice_database::MetaTagStore;
use backoffice_entity::meta_tag::{HOME_PAGE, PageMeta};

/// Where resolved meta tags came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaSource {
    /// The record keyed by the page itself.
    Page,
    /// The `home` record, used when the page has none.
    Fallback,
    /// Built-in defaults; not even `home` exists.
    Default,
}

/// Meta tags for one page render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedMeta {
    /// Page key the path normalized to.
    pub page: String,
    /// Which record supplied the values.
    pub source: MetaSource,
    /// The values.
    #[serde(flatten)]
    pub meta: PageMeta,
}

/// Normalize a request path to a page key.
///
/// Query string and fragment are dropped and surrounding slashes trimmed;
/// the root path becomes `home`.
pub fn page_key(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let key = path.trim().trim_matches('/');
    if key.is_empty() {
        HOME_PAGE.to_string()
    } else {
        key.to_string()
    }
}

/// Looks up meta tags for page renders. Read-only.
#[derive(Clone)]
pub struct MetaTagResolver {
    meta_tags: Arc<dyn MetaTagStore>,
}

impl std::fmt::Debug for MetaTagResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetaTagResolver").finish_non_exhaustive()
    }
}

impl MetaTagResolver {
    /// Creates a new resolver.
    pub fn new(meta_tags: Arc<dyn MetaTagStore>) -> Self {
        Self { meta_tags }
    }

    /// Resolve `path`: exact page, else `home`, else defaults.
    pub async fn resolve(&self, path: &str) -> AppResult<ResolvedMeta> {
        let page = page_key(path);

        if let Some(tag) = self.meta_tags.find_meta_tag_by_page(&page).await? {
            return Ok(ResolvedMeta {
                page,
                source: MetaSource::Page,
                meta: tag.into(),
            });
        }

        let (source, meta) = match self.meta_tags.find_meta_tag_by_page(HOME_PAGE).await? {
            Some(home) => (MetaSource::Fallback, PageMeta::from(home)),
            None => (MetaSource::Default, PageMeta::default()),
        };
        debug!(page = %page, source = ?source, "No meta tags for page");

        Ok(ResolvedMeta { page, source, meta })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_database::MemoryStore;
    use backoffice_entity::meta_tag::MetaTagInput;

    #[test]
    fn test_page_key() {
        assert_eq!(page_key("/"), "home");
        assert_eq!(page_key(""), "home");
        assert_eq!(page_key("/about"), "about");
        assert_eq!(page_key("about/"), "about");
        assert_eq!(page_key("/blog/first-post?ref=x"), "blog/first-post");
        assert_eq!(page_key("/#top"), "home");
    }

    #[tokio::test]
    async fn test_root_without_home_gives_defaults() {
        let resolver = MetaTagResolver::new(Arc::new(MemoryStore::new()));

        let resolved = resolver.resolve("/").await.unwrap();

        assert_eq!(resolved.page, "home");
        assert_eq!(resolved.source, MetaSource::Default);
        assert_eq!(resolved.meta, PageMeta::default());
        assert_eq!(resolved.meta.og_type, "website");
    }

    #[tokio::test]
    async fn test_fallback_to_home() {
        let store = MemoryStore::new();
        store
            .create_meta_tag(&MetaTagInput {
                title: Some("Home".into()),
                ..MetaTagInput::for_page("home")
            })
            .await
            .unwrap();
        store
            .create_meta_tag(&MetaTagInput {
                title: Some("About".into()),
                ..MetaTagInput::for_page("about")
            })
            .await
            .unwrap();
        let resolver = MetaTagResolver::new(Arc::new(store));

        let about = resolver.resolve("/about").await.unwrap();
        assert_eq!(about.source, MetaSource::Page);
        assert_eq!(about.meta.title.as_deref(), Some("About"));

        let pricing = resolver.resolve("/pricing").await.unwrap();
        assert_eq!(pricing.page, "pricing");
        assert_eq!(pricing.source, MetaSource::Fallback);
        assert_eq!(pricing.meta.title.as_deref(), Some("Home"));
    }
}
