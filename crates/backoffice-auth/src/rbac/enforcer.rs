//! RBAC enforcement: checks the acting user's granted permission names.

use tracing::debug;

use backoffice_core::error::AppError;

use super::permission::SystemPermission;

/// Enforces the management-area permission gate.
#[derive(Debug, Clone, Default)]
pub struct RbacEnforcer;

impl RbacEnforcer {
    /// Creates a new enforcer.
    pub fn new() -> Self {
        Self
    }

    /// Whether `granted` contains the required permission.
    pub fn has_permission(&self, granted: &[String], permission: SystemPermission) -> bool {
        granted.iter().any(|name| name == permission.name())
    }

    /// Returns `Ok(())` if `granted` contains the permission, or an
    /// authorization error otherwise.
    pub fn require_permission(
        &self,
        granted: &[String],
        permission: SystemPermission,
    ) -> Result<(), AppError> {
        if self.has_permission(granted, permission) {
            Ok(())
        } else {
            debug!(required = %permission, "Permission gate refused");
            Err(AppError::authorization(format!(
                "This action requires the '{permission}' permission"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_core::error::ErrorKind;

    #[test]
    fn test_require_permission() {
        let enforcer = RbacEnforcer::new();
        let granted = vec!["manage users".to_string(), "manage roles".to_string()];

        assert!(
            enforcer
                .require_permission(&granted, SystemPermission::ManageUsers)
                .is_ok()
        );
        let err = enforcer
            .require_permission(&granted, SystemPermission::ManagePermissions)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }
}
