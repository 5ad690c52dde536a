//! Error types for building the API client.

use std::fmt;

/// Errors from constructing an `ApiClient`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The base URL is empty or not an http(s) URL.
    InvalidBaseUrl { url: String },
    /// The API key cannot be sent as a header value.
    InvalidApiKey,
    /// The HTTP client could not be built.
    Http { reason: String },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBaseUrl { url } => write!(f, "invalid API base URL: '{url}'"),
            Self::InvalidApiKey => write!(f, "API key is not a valid header value"),
            Self::Http { reason } => write!(f, "failed to build HTTP client: {reason}"),
        }
    }
}

impl std::error::Error for ClientError {}
