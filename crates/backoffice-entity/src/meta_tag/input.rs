//! Validated input for creating and updating meta tags.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::model::{DEFAULT_OG_TYPE, DEFAULT_TWITTER_CARD};
use crate::rules::blank_to_none;

/// Form data for a meta tag. Every field but `page` is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct MetaTagInput {
    /// Page key.
    #[validate(custom(function = "crate::rules::not_blank"), length(max = 255))]
    pub page: String,
    /// Document title.
    #[serde(default)]
    #[validate(length(max = 255))]
    pub title: Option<String>,
    /// Meta description.
    #[serde(default)]
    pub description: Option<String>,
    /// Meta keywords.
    #[serde(default)]
    pub keywords: Option<String>,
    /// Meta author.
    #[serde(default)]
    #[validate(length(max = 255))]
    pub author: Option<String>,
    /// `og:title`.
    #[serde(default)]
    #[validate(length(max = 255))]
    pub og_title: Option<String>,
    /// `og:description`.
    #[serde(default)]
    pub og_description: Option<String>,
    /// `og:image`.
    #[serde(default)]
    #[validate(length(max = 255))]
    pub og_image: Option<String>,
    /// `og:type`, `"website"` when unset.
    #[serde(default)]
    #[validate(length(max = 255))]
    pub og_type: Option<String>,
    /// `twitter:card`, `"summary_large_image"` when unset.
    #[serde(default)]
    #[validate(length(max = 255))]
    pub twitter_card: Option<String>,
    /// `twitter:title`.
    #[serde(default)]
    #[validate(length(max = 255))]
    pub twitter_title: Option<String>,
    /// `twitter:description`.
    #[serde(default)]
    pub twitter_description: Option<String>,
    /// `twitter:image`.
    #[serde(default)]
    #[validate(length(max = 255))]
    pub twitter_image: Option<String>,
}

impl MetaTagInput {
    /// Input for `page` with every optional field unset.
    pub fn for_page(page: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            ..Self::default()
        }
    }

    /// Trim the page key and collapse blank optional fields to `None`.
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.trim().to_string(),
            title: blank_to_none(self.title),
            description: blank_to_none(self.description),
            keywords: blank_to_none(self.keywords),
            author: blank_to_none(self.author),
            og_title: blank_to_none(self.og_title),
            og_description: blank_to_none(self.og_description),
            og_image: blank_to_none(self.og_image),
            og_type: blank_to_none(self.og_type),
            twitter_card: blank_to_none(self.twitter_card),
            twitter_title: blank_to_none(self.twitter_title),
            twitter_description: blank_to_none(self.twitter_description),
            twitter_image: blank_to_none(self.twitter_image),
        }
    }

    /// The `og:type` to store.
    pub fn og_type_or_default(&self) -> String {
        self.og_type
            .clone()
            .unwrap_or_else(|| DEFAULT_OG_TYPE.to_string())
    }

    /// The `twitter:card` to store.
    pub fn twitter_card_or_default(&self) -> String {
        self.twitter_card
            .clone()
            .unwrap_or_else(|| DEFAULT_TWITTER_CARD.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_og_type_falls_back_to_default() {
        let input = MetaTagInput {
            page: " home ".into(),
            og_type: Some("  ".into()),
            ..MetaTagInput::default()
        }
        .normalized();

        assert_eq!(input.page, "home");
        assert_eq!(input.og_type, None);
        assert_eq!(input.og_type_or_default(), "website");
        assert_eq!(input.twitter_card_or_default(), "summary_large_image");
    }

    #[test]
    fn test_explicit_og_type_kept() {
        let input = MetaTagInput {
            og_type: Some("article".into()),
            ..MetaTagInput::for_page("blog")
        };
        assert_eq!(input.og_type_or_default(), "article");
    }

    #[test]
    fn test_page_required() {
        let errors = MetaTagInput::for_page("").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("page"));
    }
}
