//! # backoffice-service
//!
//! Business logic for the backoffice. Each service validates input,
//! consults the protected-entity policy, writes through a store trait and
//! records the attempt in the audit trail, returning an [`ActionOutcome`]
//! with the notification to show.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod activity;
pub mod audit;
pub mod context;
pub mod meta_tag;
pub mod outcome;
pub mod overview;
pub mod permission;
pub mod role;
pub mod seed;
pub mod user;
pub mod validation;

#[cfg(test)]
mod testing;

pub use activity::ActivityRecorder;
pub use audit::{AuditLogger, AuditService};
pub use context::RequestContext;
pub use meta_tag::{MetaSource, MetaTagResolver, MetaTagService, ResolvedMeta};
pub use outcome::ActionOutcome;
pub use overview::{Overview, OverviewService};
pub use permission::PermissionService;
pub use role::RoleService;
pub use seed::{SeedReport, Seeder};
pub use user::AdminUserService;
pub use validation::FieldErrors;
