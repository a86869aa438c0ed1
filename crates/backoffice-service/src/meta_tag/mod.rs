//! Page meta tags: admin CRUD and per-page resolution.

pub mod resolver;
pub mod service;

pub use resolver::{MetaSource, MetaTagResolver, ResolvedMeta, page_key};
pub use service::MetaTagService;
