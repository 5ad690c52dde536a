//! Session wiring shared by every page through Leptos context.

use std::sync::Arc;

use ghars_api::{ApiClient, ClientError};
use ghars_session::{ChangeSignal, ClientConfig, SessionManager, SessionSnapshot};
use leptos::prelude::*;
use leptos::task::spawn_local;
use rootcause::prelude::Report;

#[cfg(feature = "csr")]
pub type AppStore = crate::storage::BrowserCredentialStore;
#[cfg(not(feature = "csr"))]
pub type AppStore = ghars_session::MemoryCredentialStore;

/// The session manager used by the app.
pub type AppSession = SessionManager<ApiClient, AppStore>;

/// Handle to the session and the change generation.
///
/// The manager publishes snapshots on a watch channel; `snapshot` mirrors
/// them into a signal so views re-render on every transition. `generation`
/// does the same for the change signal.
#[derive(Clone)]
pub struct SessionContext {
    pub session: Arc<AppSession>,
    pub snapshot: RwSignal<SessionSnapshot>,
    pub changes: ChangeSignal,
    pub generation: RwSignal<u64>,
}

impl SessionContext {
    /// Builds the session from configuration. Nothing runs until `start`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, Report<ClientError>> {
        let api = ApiClient::new(&config.api)?;
        let session = Arc::new(SessionManager::with_config(
            api,
            new_store(config),
            &config.session,
        ));
        let changes = ChangeSignal::new();

        Ok(Self {
            snapshot: RwSignal::new(session.snapshot()),
            generation: RwSignal::new(changes.current_generation()),
            session,
            changes,
        })
    }

    /// Starts mirroring session and change updates into signals, then
    /// bootstraps the session from the persisted credential.
    pub fn start(&self) {
        let mut snapshots = self.session.subscribe();
        let snapshot = self.snapshot;
        spawn_local(async move {
            while snapshots.changed().await.is_ok() {
                let next = snapshots.borrow_and_update().clone();
                if snapshot.try_set(next).is_some() {
                    break;
                }
            }
        });

        let mut generations = self.changes.subscribe();
        let generation = self.generation;
        spawn_local(async move {
            while generations.changed().await.is_ok() {
                let next = *generations.borrow_and_update();
                if generation.try_set(next).is_some() {
                    break;
                }
            }
        });

        let session = Arc::clone(&self.session);
        spawn_local(async move {
            session.bootstrap().await;
        });
    }

    /// Re-runs hydration with the current credential.
    pub fn retry(&self) {
        let session = Arc::clone(&self.session);
        spawn_local(async move {
            session.fetch_current_user().await;
        });
    }
}

#[cfg(feature = "csr")]
fn new_store(config: &ClientConfig) -> AppStore {
    crate::storage::BrowserCredentialStore::new(config.session.storage_key.clone())
}

#[cfg(not(feature = "csr"))]
fn new_store(_config: &ClientConfig) -> AppStore {
    ghars_session::MemoryCredentialStore::new()
}

/// Returns the session context provided by `App`.
///
/// # Panics
///
/// Panics if called outside the `App` component tree.
#[must_use]
pub fn use_session() -> SessionContext {
    expect_context::<SessionContext>()
}
