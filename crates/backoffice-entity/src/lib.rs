//! # backoffice-entity
//!
//! Entity models for the backoffice. Every struct in this crate is either
//! a database table row (deriving `sqlx::FromRow`), a read model joining a
//! row with its associations, or an input DTO validated with `validator`
//! before it reaches the store.

pub mod activity;
pub mod audit;
pub mod meta_tag;
pub mod permission;
pub mod role;
pub mod rules;
pub mod user;
