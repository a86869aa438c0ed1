//! Structured result of an administrative write.

use serde::Serialize;

use backoffice_auth::policy::DenyReason;
use backoffice_core::types::notification::Notification;

use crate::validation::FieldErrors;

/// What happened to a create, update or delete.
///
/// Not-found targets and a missing permission are `Err` values of the
/// surrounding `AppResult`; everything else an operator can cause ends
/// up here together with the notification to show.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionOutcome<T> {
    /// The change was committed.
    Success {
        /// The stored entity.
        value: T,
        /// Success message.
        notification: Notification,
    },
    /// Input failed validation; nothing was written.
    Invalid {
        /// Messages per field.
        errors: FieldErrors,
    },
    /// The protected-entity policy refused the change.
    Rejected {
        /// Why.
        reason: DenyReason,
        /// Warning message.
        notification: Notification,
    },
    /// The store failed and the change was rolled back.
    Failed {
        /// Generic failure message.
        notification: Notification,
    },
}

impl<T> ActionOutcome<T> {
    /// A committed change.
    pub fn success(value: T, notification: Notification) -> Self {
        Self::Success {
            value,
            notification,
        }
    }

    /// A policy rejection with its warning.
    pub fn rejected(reason: DenyReason, message: &str) -> Self {
        Self::Rejected {
            reason,
            notification: Notification::warning(message),
        }
    }

    /// A rolled-back failure with a generic message.
    pub fn failed(message: &str) -> Self {
        Self::Failed {
            notification: Notification::danger(message),
        }
    }

    /// Whether the change was committed.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The notification to show, if the outcome carries one.
    pub fn notification(&self) -> Option<&Notification> {
        match self {
            Self::Success { notification, .. }
            | Self::Rejected { notification, .. }
            | Self::Failed { notification } => Some(notification),
            Self::Invalid { .. } => None,
        }
    }

    /// The stored entity of a committed change.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Success { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Consume the outcome, keeping the stored entity of a committed change.
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Success { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The rejection reason, if the policy refused the change.
    pub fn rejection(&self) -> Option<DenyReason> {
        match self {
            Self::Rejected { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// The field errors, if validation failed.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Invalid { errors } => Some(errors),
            _ => None,
        }
    }
}
