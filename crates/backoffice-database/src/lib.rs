//! # backoffice-database
//!
//! PostgreSQL connection management, the store traits the services write
//! through, and their two implementations: Postgres repositories and an
//! in-memory store for single-process use and tests.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;
pub mod sync;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use repositories::PgStore;
pub use store::{ActivityStore, AuditStore, MetaTagStore, PermissionStore, RoleStore, UserStore};
