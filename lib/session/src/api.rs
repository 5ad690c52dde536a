//! The REST collaborator the session core depends on.

use async_trait::async_trait;

use crate::credential::Credential;
use crate::error::ApiError;
use crate::identity::Identity;

/// Login and "who am I" endpoints.
///
/// Implementations must report an invalid or expired credential as
/// [`ApiError::Unauthorized`] and every other failure as a different variant.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait SessionApi: Send + Sync {
    /// Exchanges a password for a bearer credential.
    async fn issue_credential(&self, password: &str) -> Result<Credential, ApiError>;

    /// Returns the identity the credential belongs to.
    async fn who_am_i(&self, credential: &Credential) -> Result<Identity, ApiError>;
}
