//! Rules that refuse destructive writes regardless of who asks.
//!
//! The decision is a pure function of the target row and the acting user,
//! so it is evaluated before any transaction is opened.

use std::fmt;

use serde::{Deserialize, Serialize};

use backoffice_core::types::id::UserId;
use backoffice_entity::meta_tag::MetaTag;
use backoffice_entity::permission::Permission;
use backoffice_entity::role::Role;
use backoffice_entity::user::User;

/// Permissions the management areas are gated on. They can never be
/// deleted or renamed.
pub const CORE_PERMISSIONS: [&str; 3] = ["manage users", "manage roles", "manage permissions"];

/// The role that always holds every permission.
pub const SUPER_ADMIN_ROLE: &str = "super-admin";

/// Why the policy refused an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The permission is one of [`CORE_PERMISSIONS`].
    CorePermission,
    /// The role is [`SUPER_ADMIN_ROLE`].
    SuperAdminRole,
    /// An administrator tried to delete their own account.
    OwnAccount,
}

impl DenyReason {
    /// The warning shown to the operator.
    pub fn notice(&self) -> &'static str {
        match self {
            Self::CorePermission => "You cannot delete core system permissions.",
            Self::SuperAdminRole => "You cannot delete the super-admin role.",
            Self::OwnAccount => "You cannot delete your own account.",
        }
    }

    /// The warning shown when a rename is refused.
    pub fn rename_notice(&self) -> &'static str {
        match self {
            Self::CorePermission => "You cannot rename core system permissions.",
            Self::SuperAdminRole => "You cannot rename the super-admin role.",
            Self::OwnAccount => self.notice(),
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CorePermission => write!(f, "core system permission"),
            Self::SuperAdminRole => write!(f, "protected super-admin role"),
            Self::OwnAccount => write!(f, "cannot delete own account"),
        }
    }
}

/// Outcome of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// The action may proceed.
    Allow,
    /// The action must be refused.
    Deny(DenyReason),
}

impl PolicyDecision {
    /// Whether the action may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// The row an administrator wants to delete.
#[derive(Debug, Clone, Copy)]
pub enum DeletionTarget<'a> {
    /// A user account.
    User(&'a User),
    /// A role.
    Role(&'a Role),
    /// A permission.
    Permission(&'a Permission),
    /// A page meta tag.
    MetaTag(&'a MetaTag),
}

/// Whether `name` is one of the core permissions.
pub fn is_core_permission(name: &str) -> bool {
    CORE_PERMISSIONS.contains(&name)
}

/// Whether `name` is the protected super-admin role.
pub fn is_super_admin_role(name: &str) -> bool {
    name == SUPER_ADMIN_ROLE
}

/// The protected-entity policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtectedEntityPolicy;

impl ProtectedEntityPolicy {
    /// Creates the policy.
    pub fn new() -> Self {
        Self
    }

    /// Decide whether `acting` may delete `target`.
    pub fn can_delete(&self, target: DeletionTarget<'_>, acting: UserId) -> PolicyDecision {
        match target {
            DeletionTarget::Permission(p) if is_core_permission(&p.name) => {
                PolicyDecision::Deny(DenyReason::CorePermission)
            }
            DeletionTarget::Role(r) if is_super_admin_role(&r.name) => {
                PolicyDecision::Deny(DenyReason::SuperAdminRole)
            }
            DeletionTarget::User(u) if u.id == acting => PolicyDecision::Deny(DenyReason::OwnAccount),
            _ => PolicyDecision::Allow,
        }
    }

    /// Decide whether a role may be renamed to `new_name`.
    ///
    /// Renaming the super-admin role away would strip its protection.
    pub fn can_rename_role(&self, role: &Role, new_name: &str) -> PolicyDecision {
        if is_super_admin_role(&role.name) && role.name != new_name {
            PolicyDecision::Deny(DenyReason::SuperAdminRole)
        } else {
            PolicyDecision::Allow
        }
    }

    /// Decide whether a permission may be renamed to `new_name`.
    pub fn can_rename_permission(&self, permission: &Permission, new_name: &str) -> PolicyDecision {
        if is_core_permission(&permission.name) && permission.name != new_name {
            PolicyDecision::Deny(DenyReason::CorePermission)
        } else {
            PolicyDecision::Allow
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_core::types::id::{MetaTagId, PermissionId, RoleId};
    use chrono::Utc;

    fn permission(name: &str) -> Permission {
        Permission {
            id: PermissionId::new(),
            name: name.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn role(name: &str) -> Role {
        Role {
            id: RoleId::new(),
            name: name.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn user() -> User {
        User {
            id: UserId::new(),
            name: "Admin".into(),
            email: "admin@mail.com".into(),
            password_hash: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_core_permissions_never_deletable() {
        let policy = ProtectedEntityPolicy::new();
        for name in CORE_PERMISSIONS {
            let p = permission(name);
            assert_eq!(
                policy.can_delete(DeletionTarget::Permission(&p), UserId::new()),
                PolicyDecision::Deny(DenyReason::CorePermission)
            );
        }
        let other = permission("view reports");
        assert!(
            policy
                .can_delete(DeletionTarget::Permission(&other), UserId::new())
                .is_allowed()
        );
    }

    #[test]
    fn test_super_admin_role_never_deletable() {
        let policy = ProtectedEntityPolicy::new();
        let protected = role("super-admin");
        let decision = policy.can_delete(DeletionTarget::Role(&protected), UserId::new());
        assert_eq!(decision, PolicyDecision::Deny(DenyReason::SuperAdminRole));

        assert!(
            policy
                .can_delete(DeletionTarget::Role(&role("admin")), UserId::new())
                .is_allowed()
        );
    }

    #[test]
    fn test_own_account_not_deletable() {
        let policy = ProtectedEntityPolicy::new();
        let me = user();
        let other = user();

        assert_eq!(
            policy.can_delete(DeletionTarget::User(&me), me.id),
            PolicyDecision::Deny(DenyReason::OwnAccount)
        );
        assert!(policy.can_delete(DeletionTarget::User(&other), me.id).is_allowed());
    }

    #[test]
    fn test_meta_tags_always_deletable() {
        let now = Utc::now();
        let tag = MetaTag {
            id: MetaTagId::new(),
            page: "home".into(),
            title: None,
            description: None,
            keywords: None,
            author: None,
            og_title: None,
            og_description: None,
            og_image: None,
            og_type: "website".into(),
            twitter_card: "summary_large_image".into(),
            twitter_title: None,
            twitter_description: None,
            twitter_image: None,
            created_at: now,
            updated_at: now,
        };
        assert!(
            ProtectedEntityPolicy::new()
                .can_delete(DeletionTarget::MetaTag(&tag), UserId::new())
                .is_allowed()
        );
    }

    #[test]
    fn test_rename_rules() {
        let policy = ProtectedEntityPolicy::new();
        let protected = role("super-admin");
        assert!(!policy.can_rename_role(&protected, "root").is_allowed());
        assert!(policy.can_rename_role(&protected, "super-admin").is_allowed());
        assert!(policy.can_rename_role(&role("admin"), "staff").is_allowed());

        let core = permission("manage users");
        assert!(!policy.can_rename_permission(&core, "manage people").is_allowed());
        assert!(policy.can_rename_permission(&core, "manage users").is_allowed());
    }

    #[test]
    fn test_reason_text() {
        assert_eq!(DenyReason::CorePermission.to_string(), "core system permission");
        assert_eq!(DenyReason::SuperAdminRole.to_string(), "protected super-admin role");
        assert_eq!(DenyReason::OwnAccount.to_string(), "cannot delete own account");
    }
}
