//! Search-and-page query shared by every admin listing.

use serde::{Deserialize, Serialize};

use super::pagination::PageRequest;

/// A listing request: an optional free-text search term plus a page.
///
/// The term is matched case-insensitively as a substring against the
/// listing's search columns. Blank terms are treated as "no filter".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListQuery {
    /// Raw search input.
    #[serde(default)]
    pub search: Option<String>,
    /// Requested page.
    #[serde(default)]
    pub page: PageRequest,
}

impl ListQuery {
    /// Create a query for `page` with the given search input.
    pub fn new(search: Option<String>, page: PageRequest) -> Self {
        Self { search, page }
    }

    /// The trimmed search term, or `None` when the input is blank.
    pub fn term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    /// The term as a SQL `ILIKE` pattern with `%`, `_` and `\` escaped.
    pub fn like_pattern(&self) -> Option<String> {
        self.term().map(|term| {
            let mut pattern = String::with_capacity(term.len() + 2);
            pattern.push('%');
            for ch in term.chars() {
                if matches!(ch, '%' | '_' | '\\') {
                    pattern.push('\\');
                }
                pattern.push(ch);
            }
            pattern.push('%');
            pattern
        })
    }

    /// Case-insensitive substring match used by the in-memory store.
    pub fn matches<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> bool {
        match self.term() {
            None => true,
            Some(term) => {
                let needle = term.to_lowercase();
                fields
                    .into_iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
        }
    }
}
