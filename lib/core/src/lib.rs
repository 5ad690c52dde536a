//! Core types shared by the Ghars client crates.
//!
//! This crate provides the server-assigned identifier types and the
//! rootcause-based `Result` alias used throughout the session core.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ClassId, ParseIdError, UserId};
