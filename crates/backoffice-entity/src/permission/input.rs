//! Validated input for creating and updating permissions.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Form data for a permission.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PermissionInput {
    /// Permission name.
    #[validate(custom(function = "crate::rules::not_blank"), length(max = 255))]
    pub name: String,
}

impl PermissionInput {
    /// Trim the name.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self
    }
}
