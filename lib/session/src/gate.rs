//! Role gate for route subtrees.
//!
//! A pure function of the session snapshot and the required role set. Hosts
//! map the decision onto their router: a placeholder for `Loading`, a
//! redirect for `Redirect`, a retry panel for `Unavailable`.

use crate::manager::{SessionFailure, SessionSnapshot};
use crate::role::RoleSet;
use crate::view::View;

/// What a gated route should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// The session outcome is not known yet; show a neutral placeholder.
    Loading,
    /// Navigate elsewhere.
    Redirect(View),
    /// A credential is held but the server could not be reached; offer a retry.
    Unavailable,
    /// Render the subtree.
    Render,
}

/// Decides whether a subtree requiring `required` may render.
///
/// Never redirects while the status is unknown. An authenticated identity
/// outside `required` lands on its own role's home, not on the login page.
#[must_use]
pub fn decide(snapshot: &SessionSnapshot, required: &RoleSet) -> GateDecision {
    if snapshot.status.is_pending() {
        return GateDecision::Loading;
    }

    match &snapshot.identity {
        Some(identity) if required.contains(identity.role()) => GateDecision::Render,
        Some(identity) => GateDecision::Redirect(View::landing(identity.role())),
        None if snapshot.has_credential && is_transient(snapshot.failure.as_ref()) => {
            GateDecision::Unavailable
        }
        None => GateDecision::Redirect(View::Login),
    }
}

/// Decides what the login page should do: send a hydrated identity home,
/// otherwise show the form.
#[must_use]
pub fn decide_guest(snapshot: &SessionSnapshot) -> GateDecision {
    if snapshot.status.is_pending() {
        return GateDecision::Loading;
    }

    match &snapshot.identity {
        Some(identity) => GateDecision::Redirect(View::landing(identity.role())),
        None => GateDecision::Render,
    }
}

fn is_transient(failure: Option<&SessionFailure>) -> bool {
    failure.is_some_and(SessionFailure::is_retryable)
}
