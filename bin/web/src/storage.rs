//! Credential persistence in the browser's `localStorage`.

use ghars_session::{Credential, CredentialStore};
use tracing::warn;
use web_sys::Storage;

/// Stores the credential under one `localStorage` key.
///
/// Storage can be unavailable (private browsing, disabled by policy); every
/// operation then degrades to "no credential" instead of failing.
#[derive(Debug, Clone)]
pub struct BrowserCredentialStore {
    key: String,
}

impl BrowserCredentialStore {
    /// Creates a store for the given key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn storage(&self) -> Option<Storage> {
        let storage = web_sys::window()?.local_storage().ok().flatten();
        if storage.is_none() {
            warn!(key = %self.key, "localStorage unavailable");
        }
        storage
    }
}

impl CredentialStore for BrowserCredentialStore {
    fn save(&self, credential: &Credential) {
        let Some(storage) = self.storage() else {
            return;
        };
        if storage.set_item(&self.key, credential.as_str()).is_err() {
            warn!(key = %self.key, "Failed to persist credential");
        }
    }

    fn load(&self) -> Option<Credential> {
        let value = self.storage()?.get_item(&self.key).ok().flatten()?;
        let credential = Credential::new(value);
        (!credential.is_blank()).then_some(credential)
    }

    fn clear(&self) {
        let Some(storage) = self.storage() else {
            return;
        };
        if storage.remove_item(&self.key).is_err() {
            warn!(key = %self.key, "Failed to remove credential");
        }
    }
}
