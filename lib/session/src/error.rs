//! Error types for the session crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `MalformedCredential`: a credential the client cannot decode locally
//! - `ApiError`: failures reported by the REST collaborator
//! - `SessionError`: the session-level taxonomy surfaced to views
//! - `StoreError`: credential persistence setup failures

use ghars_core::UserId;
use std::fmt;

/// A credential string that does not decode into usable claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedCredential {
    /// What was wrong with the credential.
    pub reason: String,
}

impl MalformedCredential {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for MalformedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed credential: {}", self.reason)
    }
}

impl std::error::Error for MalformedCredential {}

/// Failures reported by the REST collaborator.
///
/// Implementations must keep authorization rejections distinguishable from
/// every other failure: only `Unauthorized` ever tears a session down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The server reports the credential (or password) as invalid or expired.
    Unauthorized,
    /// The credential is valid but lacks permission for this call.
    Forbidden { detail: String },
    /// The requested record does not exist.
    NotFound { detail: String },
    /// Any other non-success status.
    Status { status: u16, detail: String },
    /// The request never produced a response.
    Network { reason: String },
    /// The response body could not be decoded.
    Decode { reason: String },
}

impl ApiError {
    /// Returns true if this failure means the credential is dead.
    #[must_use]
    pub fn is_authorization_rejection(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "credential rejected by server"),
            Self::Forbidden { detail } => write!(f, "forbidden: {detail}"),
            Self::NotFound { detail } => write!(f, "not found: {detail}"),
            Self::Status { status, detail } => {
                write!(f, "server returned status {status}: {detail}")
            }
            Self::Network { reason } => write!(f, "network error: {reason}"),
            Self::Decode { reason } => write!(f, "failed to decode response: {reason}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Session-level failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The credential cannot be decoded locally. Treated like a rejection.
    MalformedCredential { reason: String },
    /// The server rejected the credential. The session was torn down.
    AuthorizationRejected,
    /// The credential's own expiry claim has passed. Treated like a rejection.
    CredentialExpired,
    /// Network or server fault. The credential is kept for a retry.
    TransientFailure { reason: String },
    /// An admin identity matched no entry of the landing-view priority list.
    PermissionExhausted { user_id: UserId },
    /// The login endpoint refused the password.
    InvalidPassword,
}

impl SessionError {
    /// Returns true if recovering requires the user to log in again.
    #[must_use]
    pub fn requires_login(&self) -> bool {
        !matches!(self, Self::TransientFailure { .. })
    }

    /// Returns the message shown to the user.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MalformedCredential { .. }
            | Self::AuthorizationRejected
            | Self::CredentialExpired
            | Self::PermissionExhausted { .. } => "Please log in again.",
            Self::TransientFailure { .. } => "Something went wrong. Try again.",
            Self::InvalidPassword => "Invalid password.",
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedCredential { reason } => {
                write!(f, "malformed credential: {reason}")
            }
            Self::AuthorizationRejected => write!(f, "credential rejected by server"),
            Self::CredentialExpired => write!(f, "credential has expired"),
            Self::TransientFailure { reason } => write!(f, "transient failure: {reason}"),
            Self::PermissionExhausted { user_id } => {
                write!(f, "admin {user_id} holds no capability with a landing view")
            }
            Self::InvalidPassword => write!(f, "invalid password"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<MalformedCredential> for SessionError {
    fn from(err: MalformedCredential) -> Self {
        Self::MalformedCredential { reason: err.reason }
    }
}

/// Errors from setting up credential persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The storage location could not be prepared.
    Unavailable { location: String, reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { location, reason } => {
                write!(f, "credential storage '{location}' unavailable: {reason}")
            }
        }
    }
}

impl std::error::Error for StoreError {}
