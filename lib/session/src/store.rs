//! Durable storage for the single live credential.
//!
//! Storage is treated as reliable: `save` and `clear` never fail from the
//! caller's point of view. A host that denies storage simply behaves as if
//! nothing was ever saved.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::warn;

use crate::credential::Credential;
use crate::error::StoreError;

/// Persistence for at most one credential.
pub trait CredentialStore: Send + Sync {
    /// Overwrites any persisted credential.
    fn save(&self, credential: &Credential);

    /// Returns the persisted credential, if any.
    fn load(&self) -> Option<Credential>;

    /// Removes any persisted credential. Idempotent.
    fn clear(&self);
}

/// Process-local store. Survives nothing but is handy for tests and for hosts
/// without durable storage.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds a credential.
    #[must_use]
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: Mutex::new(Some(credential)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&self, credential: &Credential) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(credential.clone());
    }

    fn load(&self) -> Option<Credential> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn clear(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Store backed by one file on disk.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Opens a store keeping the credential in `dir/file_name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl AsRef<Path>, file_name: &str) -> ghars_core::Result<Self, StoreError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| StoreError::Unavailable {
            location: dir.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            path: dir.join(file_name),
        })
    }

    /// Returns the file the credential is kept in.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn save(&self, credential: &Credential) {
        if let Err(e) = fs::write(&self.path, credential.as_str()) {
            warn!(path = %self.path.display(), error = %e, "Failed to persist credential");
        }
    }

    fn load(&self) -> Option<Credential> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let credential = Credential::new(contents.trim());
                (!credential.is_blank()).then_some(credential)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read credential");
                None
            }
        }
    }

    fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to remove credential");
            }
        }
    }
}
