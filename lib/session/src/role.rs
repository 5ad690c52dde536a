//! Role types for role-gated views.
//!
//! Every identity the server confirms carries exactly one role. Route
//! subtrees declare the set of roles they accept.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Account role reported by the server.
///
/// The platform uses two kinds of accounts:
/// - `Student`: sees their own points and the learning weeks
/// - `Admin`: manages students, classes, weeks and points, scoped by capability flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Learner account.
    Student,
    /// Staff account with capability flags.
    Admin,
}

impl Role {
    /// Returns true if this role has admin privileges.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns the wire name of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Admin => "admin",
        }
    }

    /// Parses a wire role name.
    #[must_use]
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "student" => Some(Self::Student),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of roles a route subtree accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet {
    roles: Vec<Role>,
}

impl RoleSet {
    /// Creates an empty role set (accepts nobody).
    #[must_use]
    pub fn none() -> Self {
        Self { roles: Vec::new() }
    }

    /// Creates a role set accepting students only.
    #[must_use]
    pub fn student() -> Self {
        Self {
            roles: vec![Role::Student],
        }
    }

    /// Creates a role set accepting admins only.
    #[must_use]
    pub fn admin() -> Self {
        Self {
            roles: vec![Role::Admin],
        }
    }

    /// Creates a role set accepting any authenticated identity.
    #[must_use]
    pub fn any() -> Self {
        Self {
            roles: vec![Role::Student, Role::Admin],
        }
    }

    /// Creates a role set from a list of roles, dropping duplicates.
    #[must_use]
    pub fn from_roles(roles: &[Role]) -> Self {
        let mut unique = Vec::with_capacity(roles.len());
        for role in roles {
            if !unique.contains(role) {
                unique.push(*role);
            }
        }
        Self { roles: unique }
    }

    /// Returns true if the given role is accepted.
    #[must_use]
    pub fn contains(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Returns the roles as a slice.
    #[must_use]
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}

impl Default for RoleSet {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_is_admin() {
        assert!(!Role::Student.is_admin());
        assert!(Role::Admin.is_admin());
    }

    #[test]
    fn role_from_wire() {
        assert_eq!(Role::from_wire("student"), Some(Role::Student));
        assert_eq!(Role::from_wire("admin"), Some(Role::Admin));
        assert_eq!(Role::from_wire("parent"), None);
        assert_eq!(Role::from_wire("Admin"), None);
    }

    #[test]
    fn role_set_none_accepts_nobody() {
        let roles = RoleSet::none();
        assert!(!roles.contains(Role::Student));
        assert!(!roles.contains(Role::Admin));
    }

    #[test]
    fn role_set_student_only() {
        let roles = RoleSet::student();
        assert!(roles.contains(Role::Student));
        assert!(!roles.contains(Role::Admin));
    }

    #[test]
    fn role_set_admin_does_not_imply_student() {
        let roles = RoleSet::admin();
        assert!(roles.contains(Role::Admin));
        assert!(!roles.contains(Role::Student));
    }

    #[test]
    fn from_roles_drops_duplicates() {
        let roles = RoleSet::from_roles(&[Role::Admin, Role::Student, Role::Admin]);
        assert_eq!(roles.roles(), &[Role::Admin, Role::Student]);
        assert_eq!(roles, RoleSet::from_roles(&[Role::Admin, Role::Student]));
    }

    #[test]
    fn role_serialization_format() {
        let json = serde_json::to_string(&Role::Admin).expect("serialize");
        assert_eq!(json, "\"admin\"");

        let json = serde_json::to_string(&Role::Student).expect("serialize");
        assert_eq!(json, "\"student\"");
    }
}
