//! Meta tag entity model and the resolved per-page meta value.

use backoffice_core::types::id::MetaTagId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Page key of the global fallback record.
pub const HOME_PAGE: &str = "home";
/// Open Graph type stored when none is given.
pub const DEFAULT_OG_TYPE: &str = "website";
/// Twitter card stored when none is given.
pub const DEFAULT_TWITTER_CARD: &str = "summary_large_image";

/// SEO and social metadata for one page, keyed by `page`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MetaTag {
    /// Unique record identifier.
    pub id: MetaTagId,
    /// Unique page key, e.g. `"home"` or `"blog/launch"`.
    pub page: String,
    /// Document title.
    pub title: Option<String>,
    /// Meta description.
    pub description: Option<String>,
    /// Meta keywords.
    pub keywords: Option<String>,
    /// Meta author.
    pub author: Option<String>,
    /// `og:title`.
    pub og_title: Option<String>,
    /// `og:description`.
    pub og_description: Option<String>,
    /// `og:image`.
    pub og_image: Option<String>,
    /// `og:type`.
    pub og_type: String,
    /// `twitter:card`.
    pub twitter_card: String,
    /// `twitter:title`.
    pub twitter_title: Option<String>,
    /// `twitter:description`.
    pub twitter_description: Option<String>,
    /// `twitter:image`.
    pub twitter_image: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

/// The meta values rendered for a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Document title.
    pub title: Option<String>,
    /// Meta description.
    pub description: Option<String>,
    /// Meta keywords.
    pub keywords: Option<String>,
    /// Meta author.
    pub author: Option<String>,
    /// `og:title`.
    pub og_title: Option<String>,
    /// `og:description`.
    pub og_description: Option<String>,
    /// `og:image`.
    pub og_image: Option<String>,
    /// `og:type`.
    pub og_type: String,
    /// `twitter:card`.
    pub twitter_card: String,
    /// `twitter:title`.
    pub twitter_title: Option<String>,
    /// `twitter:description`.
    pub twitter_description: Option<String>,
    /// `twitter:image`.
    pub twitter_image: Option<String>,
}

impl Default for PageMeta {
    fn default() -> Self {
        Self {
            title: None,
            description: None,
            keywords: None,
            author: None,
            og_title: None,
            og_description: None,
            og_image: None,
            og_type: DEFAULT_OG_TYPE.to_string(),
            twitter_card: DEFAULT_TWITTER_CARD.to_string(),
            twitter_title: None,
            twitter_description: None,
            twitter_image: None,
        }
    }
}

impl From<MetaTag> for PageMeta {
    fn from(tag: MetaTag) -> Self {
        Self {
            title: tag.title,
            description: tag.description,
            keywords: tag.keywords,
            author: tag.author,
            og_title: tag.og_title,
            og_description: tag.og_description,
            og_image: tag.og_image,
            og_type: tag.og_type,
            twitter_card: tag.twitter_card,
            twitter_title: tag.twitter_title,
            twitter_description: tag.twitter_description,
            twitter_image: tag.twitter_image,
        }
    }
}
