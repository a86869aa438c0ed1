//! Validated input for creating and updating users.

use backoffice_core::types::id::RoleId;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Form data for a new user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateUserInput {
    /// Display name.
    #[validate(custom(function = "crate::rules::not_blank"), length(max = 255))]
    pub name: String,
    /// Email address.
    #[validate(
        custom(function = "crate::rules::not_blank"),
        email(message = "The email must be a valid email address."),
        length(max = 255)
    )]
    pub email: String,
    /// Plaintext password, hashed before storage.
    #[serde(skip_serializing)]
    #[validate(
        length(min = 8, message = "The password must be at least 8 characters."),
        must_match(
            other = "password_confirmation",
            message = "The password confirmation does not match."
        )
    )]
    pub password: String,
    /// Repeated password.
    #[serde(skip_serializing)]
    pub password_confirmation: String,
    /// Roles to hold after the save.
    #[serde(default)]
    pub role_ids: Vec<RoleId>,
}

impl CreateUserInput {
    /// Trim surrounding whitespace from name and email.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_string();
        self
    }
}

/// Form data for editing a user. A blank password keeps the stored one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateUserInput {
    /// Display name.
    #[validate(custom(function = "crate::rules::not_blank"), length(max = 255))]
    pub name: String,
    /// Email address.
    #[validate(
        custom(function = "crate::rules::not_blank"),
        email(message = "The email must be a valid email address."),
        length(max = 255)
    )]
    pub email: String,
    /// New plaintext password, if it should change. Confirmation is
    /// checked by [`UpdateUserInput::password_confirmed`].
    #[serde(default, skip_serializing)]
    #[validate(length(min = 8, message = "The password must be at least 8 characters."))]
    pub password: Option<String>,
    /// Repeated new password.
    #[serde(default, skip_serializing)]
    pub password_confirmation: Option<String>,
    /// Roles to hold after the save.
    #[serde(default)]
    pub role_ids: Vec<RoleId>,
}

impl UpdateUserInput {
    /// Trim name and email and collapse a blank password (and its
    /// confirmation) to `None`.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_string();
        self.password = self.password.filter(|p| !p.is_empty());
        self.password_confirmation = self.password_confirmation.filter(|p| !p.is_empty());
        if self.password.is_none() {
            self.password_confirmation = None;
        }
        self
    }

    /// Whether a new password, if any, matches its confirmation.
    pub fn password_confirmed(&self) -> bool {
        match &self.password {
            Some(password) => self.password_confirmation.as_ref() == Some(password),
            None => true,
        }
    }
}
