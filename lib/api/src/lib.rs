//! REST client for the Ghars backend.
//!
//! `ApiClient` implements [`ghars_session::SessionApi`] for the login and
//! profile endpoints and exposes the student endpoints the client views use.
//! Every failure is classified into [`ghars_session::ApiError`] so the session
//! layer can tell a dead credential from a network hiccup.

pub mod client;
pub mod error;
pub mod wire;

pub use client::{ApiClient, RejectionPolicy, classify_status};
pub use error::ClientError;
pub use wire::{PointsAward, ProfileRecord, StudentRecord, TokenResponse};
