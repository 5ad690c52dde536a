//! Client-side session and authorization core for Ghars.
//!
//! This crate provides:
//! - Credential persistence (`CredentialStore` with memory and file backends)
//! - Local credential decoding (`decode`, `Claims`)
//! - The session lifecycle state machine (`SessionManager`)
//! - Role gating for route subtrees (`gate::decide`, `GateDecision`)
//! - Admin landing view selection (`PermissionRouter`)
//! - Cross-view invalidation (`ChangeSignal`, `GenerationCache`)
//!
//! # Session Model
//!
//! The session is a credential plus, once hydrated, the identity the server
//! reports for it. The server is the only source of truth for the identity;
//! claims decoded locally only decide whether a credential is worth sending.
//! An authorization rejection tears the whole session down, while a transient
//! failure keeps the credential so a retry can recover.
//!
//! # Example
//!
//! ```
//! use ghars_core::UserId;
//! use ghars_session::{
//!     AdminCapabilities, Capability, GateDecision, HydrationStatus, Identity,
//!     PermissionRouter, RoleSet, SessionSnapshot, View, gate,
//! };
//!
//! let admin = Identity::admin(
//!     UserId::new(3),
//!     "Noura",
//!     AdminCapabilities::none().with(Capability::ManageWeeks),
//! );
//! assert_eq!(PermissionRouter::default().resolve(&admin), View::AdminWeeks);
//!
//! let snapshot = SessionSnapshot {
//!     status: HydrationStatus::Hydrated,
//!     identity: Some(admin),
//!     has_credential: true,
//!     failure: None,
//! };
//! assert_eq!(gate::decide(&snapshot, &RoleSet::admin()), GateDecision::Render);
//! assert_eq!(
//!     gate::decide(&snapshot, &RoleSet::student()),
//!     GateDecision::Redirect(View::AdminHome)
//! );
//! ```

pub mod api;
pub mod capability;
pub mod config;
pub mod credential;
pub mod decoder;
pub mod error;
pub mod gate;
pub mod identity;
pub mod manager;
pub mod role;
pub mod router;
pub mod signal;
pub mod store;
pub mod view;

// Re-export main types at crate root
pub use api::SessionApi;
pub use capability::{AdminCapabilities, Capability};
pub use config::{ApiConfig, ClientConfig, SessionConfig};
pub use credential::Credential;
pub use decoder::{Claims, decode};
pub use error::{ApiError, MalformedCredential, SessionError, StoreError};
pub use gate::GateDecision;
pub use identity::{AdminProfile, Identity, Profile, StudentProfile};
pub use manager::{
    Hydration, HydrationOutcome, HydrationStatus, HydrationTicket, SessionFailure,
    SessionManager, SessionSnapshot,
};
pub use role::{Role, RoleSet};
pub use router::PermissionRouter;
pub use signal::{ChangeSignal, GenerationCache, GenerationObserver};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use view::View;
