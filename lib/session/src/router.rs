//! Landing view selection for admins.
//!
//! Different admins hold different capability subsets, so there is no single
//! admin default. The router walks an ordered list of (capability, view)
//! pairs and picks the first one the identity holds. Order encodes product
//! priority and is preserved exactly as configured.

use tracing::warn;

use crate::capability::Capability;
use crate::error::SessionError;
use crate::identity::Identity;
use crate::view::View;

/// Ordered capability-to-view routing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRouter {
    routes: Vec<(Capability, View)>,
}

impl PermissionRouter {
    /// Creates a router with no routes. Every identity resolves to login.
    #[must_use]
    pub fn empty() -> Self {
        Self { routes: Vec::new() }
    }

    /// Appends a route. Earlier routes win.
    #[must_use]
    pub fn route(mut self, capability: Capability, view: View) -> Self {
        self.routes.push((capability, view));
        self
    }

    /// Returns the routes in priority order.
    #[must_use]
    pub fn routes(&self) -> &[(Capability, View)] {
        &self.routes
    }

    /// Returns the first view the identity's capabilities grant.
    ///
    /// # Errors
    ///
    /// Returns `PermissionExhausted` if no route matches.
    pub fn try_resolve(&self, identity: &Identity) -> Result<View, SessionError> {
        self.routes
            .iter()
            .find(|(capability, _)| identity.can(*capability))
            .map(|(_, view)| *view)
            .ok_or(SessionError::PermissionExhausted {
                user_id: identity.id(),
            })
    }

    /// Like `try_resolve`, but falls back to the login view.
    ///
    /// An admin without any routable capability is a misconfiguration, so
    /// the fallback is logged rather than surfaced as a user error.
    #[must_use]
    pub fn resolve(&self, identity: &Identity) -> View {
        self.try_resolve(identity).unwrap_or_else(|e| {
            warn!(
                user_id = %identity.id(),
                role = %identity.role(),
                error = %e,
                "No landing view for identity; sending to login"
            );
            View::Login
        })
    }
}

impl Default for PermissionRouter {
    fn default() -> Self {
        Self::empty()
            .route(Capability::ManageStudents, View::AdminUsers)
            .route(Capability::ManageAdmins, View::AdminUsers)
            .route(Capability::ManageClasses, View::AdminUsers)
            .route(Capability::ManageWeeks, View::AdminWeeks)
            .route(Capability::ManagePoints, View::AdminPoints)
            .route(Capability::ViewAnalytics, View::AdminAnalytics)
    }
}
