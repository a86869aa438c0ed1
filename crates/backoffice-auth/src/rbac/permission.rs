//! Permissions that gate the management areas.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A permission a management area requires of the acting user.
///
/// Each variant is stored as a `permissions` row whose name is
/// [`SystemPermission::name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemPermission {
    /// Manage user accounts.
    ManageUsers,
    /// Manage roles and their permission grants.
    ManageRoles,
    /// Manage permissions.
    ManagePermissions,
}

impl SystemPermission {
    /// Every gate permission.
    pub const ALL: [SystemPermission; 3] = [
        Self::ManageUsers,
        Self::ManageRoles,
        Self::ManagePermissions,
    ];

    /// The stored permission name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ManageUsers => "manage users",
            Self::ManageRoles => "manage roles",
            Self::ManagePermissions => "manage permissions",
        }
    }
}

impl fmt::Display for SystemPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::CORE_PERMISSIONS;

    #[test]
    fn test_gate_permissions_are_the_core_permissions() {
        let names: Vec<&str> = SystemPermission::ALL.iter().map(|p| p.name()).collect();
        assert_eq!(names, CORE_PERMISSIONS.to_vec());
    }
}
