//! Audit trail: recording admin actions and listing them.

pub mod logger;
pub mod service;

pub use logger::{AuditLogger, AuditTarget, AuditVerb};
pub use service::AuditService;
