//! Flash-style notification returned with every admin action.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity of a notification shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// The action completed.
    Success,
    /// The action was refused by policy.
    Warning,
    /// The action failed.
    Danger,
    /// Informational message.
    Info,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Danger => write!(f, "danger"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A message plus its severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Text shown to the operator.
    pub message: String,
    /// Severity.
    pub kind: NotificationKind,
}

impl Notification {
    /// Create a success notification.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NotificationKind::Success,
        }
    }

    /// Create a warning notification.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NotificationKind::Warning,
        }
    }

    /// Create a danger notification.
    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NotificationKind::Danger,
        }
    }

    /// Create an info notification.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NotificationKind::Info,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}
