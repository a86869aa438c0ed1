//! Page meta tag entities.

pub mod input;
pub mod model;

pub use input::MetaTagInput;
pub use model::{DEFAULT_OG_TYPE, DEFAULT_TWITTER_CARD, HOME_PAGE, MetaTag, PageMeta};
