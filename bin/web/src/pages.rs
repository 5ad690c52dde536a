//! Page components for the application.
//!
//! Each page is a Leptos component that renders a specific route. Pages read
//! the session through context and make their own API calls through
//! `SessionManager::authorized`, so a rejected credential anywhere ends the
//! session.

use ghars_session::{ApiError, SessionError};

pub mod admin;
pub mod dashboard;
pub mod login;

// Re-export all page components for convenient access
pub use admin::{AdminIndex, AdminPlaceholder, AdminPointsPage};
pub use dashboard::DashboardPage;
pub use login::LoginPage;

/// Returns the message shown for a failed API call.
pub(crate) fn api_failure_message(err: &ApiError) -> String {
    match err {
        ApiError::Unauthorized => SessionError::AuthorizationRejected.user_message().to_string(),
        ApiError::Forbidden { detail } | ApiError::NotFound { detail } => detail.clone(),
        ApiError::Status { .. } | ApiError::Network { .. } | ApiError::Decode { .. } => {
            SessionError::TransientFailure {
                reason: err.to_string(),
            }
            .user_message()
            .to_string()
        }
    }
}
