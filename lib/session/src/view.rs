//! Named navigation targets.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::role::Role;

/// A view the client can redirect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Login,
    StudentHome,
    AdminHome,
    AdminUsers,
    AdminWeeks,
    AdminPoints,
    AdminAnalytics,
}

impl View {
    /// Returns the route path of the view.
    #[must_use]
    pub fn path(&self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::StudentHome => "/dashboard",
            Self::AdminHome => "/admin",
            Self::AdminUsers => "/admin/users",
            Self::AdminWeeks => "/admin/weeks",
            Self::AdminPoints => "/admin/points",
            Self::AdminAnalytics => "/admin/analytics",
        }
    }

    /// Returns the default landing view for a role.
    #[must_use]
    pub fn landing(role: Role) -> Self {
        match role {
            Role::Student => Self::StudentHome,
            Role::Admin => Self::AdminHome,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
