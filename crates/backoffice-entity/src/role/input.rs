//! Validated input for creating and updating roles.

use backoffice_core::types::id::PermissionId;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Form data for a role.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RoleInput {
    /// Role name.
    #[validate(custom(function = "crate::rules::not_blank"), length(max = 255))]
    pub name: String,
    /// Permissions the role grants after the save. May be empty.
    #[serde(default)]
    pub permission_ids: Vec<PermissionId>,
}

impl RoleInput {
    /// Trim the name and drop duplicate permission ids, keeping order.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        let mut seen = std::collections::HashSet::new();
        self.permission_ids.retain(|id| seen.insert(*id));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_dedups_permissions() {
        let a = PermissionId::new();
        let b = PermissionId::new();
        let input = RoleInput {
            name: "  editor ".into(),
            permission_ids: vec![a, b, a],
        }
        .normalized();

        assert_eq!(input.name, "editor");
        assert_eq!(input.permission_ids, vec![a, b]);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_name_length_limit() {
        let input = RoleInput {
            name: "r".repeat(256),
            permission_ids: Vec::new(),
        };
        assert!(input.validate().is_err());
    }
}
