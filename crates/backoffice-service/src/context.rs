//! Request context carrying the acting administrator and their permissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use backoffice_core::types::id::UserId;

/// Context for the current administrative request.
///
/// Built by the presentation layer from the authenticated identity and
/// passed into every service method so each operation knows *who* is
/// acting and *what* they are allowed to do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The acting user's ID.
    pub user_id: UserId,
    /// The acting user's email.
    pub email: String,
    /// Names of every permission granted through the user's roles.
    pub permissions: Vec<String>,
    /// IP address of the request origin.
    pub ip_address: Option<String>,
    /// User-Agent header value.
    pub user_agent: Option<String>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user_id: UserId, email: impl Into<String>, permissions: Vec<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            permissions,
            ip_address: None,
            user_agent: None,
            request_time: Utc::now(),
        }
    }

    /// Attach client details recorded in audit entries.
    pub fn with_client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }
}
