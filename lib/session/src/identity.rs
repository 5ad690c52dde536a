//! Identity domain type.
//!
//! The Identity is the server-confirmed record of who holds the current
//! credential. It is built from the "who am I" response together with the
//! role and capability claims of the credential that call was made with, and
//! is never patched afterwards: each successful hydration replaces it
//! wholesale.

use ghars_core::{ClassId, UserId};
use serde::{Deserialize, Serialize};

use crate::capability::{AdminCapabilities, Capability};
use crate::role::Role;

/// The authoritative user record returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Server account ID.
    id: UserId,
    /// Display name. Admin documents may omit it.
    #[serde(default)]
    name: String,
    /// Role-specific fields, tagged by the `role` field.
    #[serde(flatten)]
    profile: Profile,
}

/// Role-specific part of an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Profile {
    /// A student's points and class membership.
    Student(StudentProfile),
    /// An admin's capability grant.
    Admin(AdminProfile),
}

/// Fields the server reports for students.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    /// Accumulated points.
    #[serde(default)]
    pub points: i64,
    /// Class the student belongs to, if any.
    #[serde(default)]
    pub class_id: Option<ClassId>,
    /// Denormalized class name.
    #[serde(default)]
    pub class_name: Option<String>,
    /// Avatar URL.
    #[serde(default)]
    pub profile_pic_url: Option<String>,
}

/// Fields the server reports for admins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminProfile {
    /// Capability flags.
    #[serde(flatten)]
    pub capabilities: AdminCapabilities,
    /// Avatar URL.
    #[serde(default)]
    pub profile_pic_url: Option<String>,
}

impl Identity {
    /// Creates a student identity.
    #[must_use]
    pub fn student(id: UserId, name: impl Into<String>, points: i64) -> Self {
        Self {
            id,
            name: name.into(),
            profile: Profile::Student(StudentProfile {
                points,
                ..StudentProfile::default()
            }),
        }
    }

    /// Creates an admin identity with the given capabilities.
    #[must_use]
    pub fn admin(id: UserId, name: impl Into<String>, capabilities: AdminCapabilities) -> Self {
        Self {
            id,
            name: name.into(),
            profile: Profile::Admin(AdminProfile {
                capabilities,
                profile_pic_url: None,
            }),
        }
    }

    /// Creates an identity from its parts.
    #[must_use]
    pub fn with_profile(id: UserId, name: impl Into<String>, profile: Profile) -> Self {
        Self {
            id,
            name: name.into(),
            profile,
        }
    }

    /// Returns the account ID.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the role-specific fields.
    #[must_use]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Returns the account role.
    #[must_use]
    pub fn role(&self) -> Role {
        match self.profile {
            Profile::Student(_) => Role::Student,
            Profile::Admin(_) => Role::Admin,
        }
    }

    /// Returns true if this is an admin identity.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role().is_admin()
    }

    /// Returns the admin capability flags; students have none.
    #[must_use]
    pub fn capabilities(&self) -> AdminCapabilities {
        match &self.profile {
            Profile::Admin(admin) => admin.capabilities,
            Profile::Student(_) => AdminCapabilities::none(),
        }
    }

    /// Returns true if the identity holds the given capability.
    #[must_use]
    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities().has(capability)
    }

    /// Returns the student's points, or None for admins.
    #[must_use]
    pub fn points(&self) -> Option<i64> {
        match &self.profile {
            Profile::Student(student) => Some(student.points),
            Profile::Admin(_) => None,
        }
    }
}
