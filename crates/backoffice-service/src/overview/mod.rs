//! Admin dashboard overview.

pub mod service;

pub use service::{Overview, OverviewService};
