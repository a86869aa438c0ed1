//! Authentication events emitted by the identity provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::id::UserId;

/// A login or logout observed by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthEvent {
    /// A user signed in.
    Login {
        /// The authenticated user.
        user_id: UserId,
        /// Client IP address, if known.
        ip_address: Option<String>,
        /// Client user agent, if known.
        user_agent: Option<String>,
        /// When the login happened.
        at: DateTime<Utc>,
    },
    /// A user signed out.
    Logout {
        /// The user whose session ended.
        user_id: UserId,
        /// Client IP address, if known.
        ip_address: Option<String>,
        /// Client user agent, if known.
        user_agent: Option<String>,
        /// When the logout happened.
        at: DateTime<Utc>,
    },
}

impl AuthEvent {
    /// The user the event belongs to.
    pub fn user_id(&self) -> UserId {
        match self {
            Self::Login { user_id, .. } | Self::Logout { user_id, .. } => *user_id,
        }
    }

    /// When the event happened.
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Self::Login { at, .. } | Self::Logout { at, .. } => *at,
        }
    }
}
