//! Admin capability flags.
//!
//! Admins are not all equal: each one is granted a subset of management
//! areas. The server reports the grant as six boolean flags on the admin's
//! identity document.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One management area an admin may be authorized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ManageStudents,
    ManageAdmins,
    ManageClasses,
    ManageWeeks,
    ManagePoints,
    ViewAnalytics,
}

impl Capability {
    /// All capabilities, in declaration order.
    pub const ALL: [Capability; 6] = [
        Self::ManageStudents,
        Self::ManageAdmins,
        Self::ManageClasses,
        Self::ManageWeeks,
        Self::ManagePoints,
        Self::ViewAnalytics,
    ];

    /// Returns the flag name used in identity documents and tokens.
    #[must_use]
    pub fn flag_name(&self) -> &'static str {
        match self {
            Self::ManageStudents => "can_manage_students",
            Self::ManageAdmins => "can_manage_admins",
            Self::ManageClasses => "can_manage_classes",
            Self::ManageWeeks => "can_manage_weeks",
            Self::ManagePoints => "can_manage_points",
            Self::ViewAnalytics => "can_view_analytics",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag_name())
    }
}

/// The capability flags carried by an admin identity.
///
/// Flags missing from the server document deserialize as `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCapabilities {
    #[serde(default)]
    pub can_manage_students: bool,
    #[serde(default)]
    pub can_manage_admins: bool,
    #[serde(default)]
    pub can_manage_classes: bool,
    #[serde(default)]
    pub can_manage_weeks: bool,
    #[serde(default)]
    pub can_manage_points: bool,
    #[serde(default)]
    pub can_view_analytics: bool,
}

impl AdminCapabilities {
    /// No capabilities granted.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Every capability granted.
    #[must_use]
    pub fn all() -> Self {
        Capability::ALL
            .iter()
            .fold(Self::none(), |caps, capability| caps.with(*capability))
    }

    /// Returns a copy with the given capability granted.
    #[must_use]
    pub fn with(mut self, capability: Capability) -> Self {
        *self.flag_mut(capability) = true;
        self
    }

    /// Returns true if the capability is granted.
    #[must_use]
    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::ManageStudents => self.can_manage_students,
            Capability::ManageAdmins => self.can_manage_admins,
            Capability::ManageClasses => self.can_manage_classes,
            Capability::ManageWeeks => self.can_manage_weeks,
            Capability::ManagePoints => self.can_manage_points,
            Capability::ViewAnalytics => self.can_view_analytics,
        }
    }

    /// Returns true if no capability is granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !Capability::ALL.iter().any(|capability| self.has(*capability))
    }

    fn flag_mut(&mut self, capability: Capability) -> &mut bool {
        match capability {
            Capability::ManageStudents => &mut self.can_manage_students,
            Capability::ManageAdmins => &mut self.can_manage_admins,
            Capability::ManageClasses => &mut self.can_manage_classes,
            Capability::ManageWeeks => &mut self.can_manage_weeks,
            Capability::ManagePoints => &mut self.can_manage_points,
            Capability::ViewAnalytics => &mut self.can_view_analytics,
        }
    }
}
