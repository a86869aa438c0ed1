//! Audit trail entities.

pub mod model;
pub mod outcome;

pub use model::{AuditLogEntry, AuditQuery, CreateAuditLogEntry};
pub use outcome::AuditOutcome;
