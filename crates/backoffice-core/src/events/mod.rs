//! Domain events consumed by the backoffice.
//!
//! Authentication itself happens elsewhere; the identity provider hands
//! login/logout events to the activity recorder.

pub mod auth;

pub use auth::AuthEvent;
