//! The session lifecycle state machine.
//!
//! `SessionManager` owns the credential and the hydrated identity:
//!
//! ```text
//! uninitialized ──► hydrating ──► hydrated
//!                       │             │ logout / rejection
//!                       ▼             ▼
//!                    absent ◄─────────┘
//!                       │ login
//!                       └──► hydrating
//! ```
//!
//! Hydration is a single logical in-flight operation. Every attempt is tagged
//! with a request id; a response whose id is no longer the latest is
//! discarded on arrival, so a slow response can never resurrect a session
//! that was logged out or replaced in the meantime.
//!
//! Failures split into two branches that must stay apart:
//! - authorization rejection (or a credential that cannot even be decoded)
//!   tears the session down and clears the stored credential;
//! - transient failures hide the identity but keep the credential so a later
//!   retry can hydrate without a new login.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Duration, Utc};
use ghars_core::UserId;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::api::SessionApi;
use crate::config::SessionConfig;
use crate::credential::Credential;
use crate::decoder;
use crate::error::{ApiError, SessionError};
use crate::identity::Identity;
use crate::store::CredentialStore;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HydrationStatus {
    /// Bootstrap has not run yet.
    Uninitialized,
    /// A "who am I" call is in flight.
    Hydrating,
    /// The identity is loaded.
    Hydrated,
    /// No usable identity.
    Absent,
}

impl HydrationStatus {
    /// Returns true while the outcome of the session is not yet known.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Uninitialized | Self::Hydrating)
    }
}

/// The last failure the user should be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionFailure {
    /// The server rejected the credential.
    Rejected,
    /// The stored credential could not be decoded.
    Malformed,
    /// The credential's expiry claim has passed.
    Expired,
    /// Network or server fault; the credential was kept.
    Transient { reason: String },
    /// The admin holds no capability that leads to a screen.
    NoLandingView { user_id: UserId },
}

impl SessionFailure {
    /// Returns the session error this failure corresponds to.
    #[must_use]
    pub fn to_error(&self) -> SessionError {
        match self {
            Self::Rejected => SessionError::AuthorizationRejected,
            Self::Malformed => SessionError::MalformedCredential {
                reason: "stored credential could not be decoded".to_string(),
            },
            Self::Expired => SessionError::CredentialExpired,
            Self::Transient { reason } => SessionError::TransientFailure {
                reason: reason.clone(),
            },
            Self::NoLandingView { user_id } => SessionError::PermissionExhausted {
                user_id: *user_id,
            },
        }
    }

    /// Returns true if the user can recover by retrying, without a new login.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// A consistent copy of the session, published on every transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub status: HydrationStatus,
    pub identity: Option<Identity>,
    pub has_credential: bool,
    pub failure: Option<SessionFailure>,
}

impl SessionSnapshot {
    /// The snapshot of a manager that has not bootstrapped.
    #[must_use]
    pub fn uninitialized() -> Self {
        Self {
            status: HydrationStatus::Uninitialized,
            identity: None,
            has_credential: false,
            failure: None,
        }
    }

    /// Returns true while a hydration is in flight.
    #[must_use]
    pub fn is_hydrating(&self) -> bool {
        self.status == HydrationStatus::Hydrating
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::uninitialized()
    }
}

/// How a hydration attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationOutcome {
    /// No credential was present; the session is absent.
    NoCredential,
    /// The identity was loaded.
    Hydrated,
    /// The server rejected the credential; the session was torn down.
    Rejected,
    /// The credential could not be decoded; the session was torn down.
    Malformed,
    /// The credential had expired locally; the session was torn down.
    Expired,
    /// Network or server fault; the credential was kept.
    Transient,
    /// A newer login, hydration or logout made this result irrelevant.
    Superseded,
}

/// An in-flight hydration request.
#[derive(Debug)]
pub struct HydrationTicket {
    request_id: u64,
    credential: Credential,
}

impl HydrationTicket {
    /// Returns the request id this attempt was tagged with.
    #[must_use]
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    /// Returns the credential to present to the "who am I" endpoint.
    #[must_use]
    pub fn credential(&self) -> &Credential {
        &self.credential
    }
}

/// Result of starting a hydration.
#[derive(Debug)]
pub enum Hydration {
    /// The caller must ask the server and hand the result to `complete_hydration`.
    Pending(HydrationTicket),
    /// The attempt settled locally without a network call.
    Settled(HydrationOutcome),
}

#[derive(Debug)]
struct SessionState {
    credential: Option<Credential>,
    identity: Option<Identity>,
    status: HydrationStatus,
    failure: Option<SessionFailure>,
    latest_request: u64,
}

impl SessionState {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            identity: self.identity.clone(),
            has_credential: self.credential.is_some(),
            failure: self.failure.clone(),
        }
    }
}

/// Owns the credential and identity and drives the session lifecycle.
///
/// One instance per process; hosts pass it down explicitly (e.g. behind an
/// `Arc`) instead of reaching for global state. Only the manager mutates the
/// session; everything else reads snapshots.
pub struct SessionManager<A, S> {
    api: A,
    store: S,
    expiry_leeway: Duration,
    state: Mutex<SessionState>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl<A, S> SessionManager<A, S>
where
    A: SessionApi,
    S: CredentialStore,
{
    /// Creates a manager with default session settings.
    #[must_use]
    pub fn new(api: A, store: S) -> Self {
        Self::with_config(api, store, &SessionConfig::default())
    }

    /// Creates a manager with the given session settings.
    #[must_use]
    pub fn with_config(api: A, store: S, config: &SessionConfig) -> Self {
        let (snapshots, _) = watch::channel(SessionSnapshot::uninitialized());
        Self {
            api,
            store,
            expiry_leeway: config.expiry_leeway(),
            state: Mutex::new(SessionState {
                credential: None,
                identity: None,
                status: HydrationStatus::Uninitialized,
                failure: None,
                latest_request: 0,
            }),
            snapshots,
        }
    }

    /// Returns the API collaborator.
    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Returns the credential store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads the persisted credential into memory. Returns true if one was found.
    ///
    /// If the persisted credential differs from the one in memory, the
    /// identity belonged to the old credential: it is dropped, any hydration
    /// in flight is superseded, and a bootstrapped session becomes absent
    /// until the next hydration.
    pub fn restore(&self) -> bool {
        let persisted = self.store.load();
        let found = persisted.is_some();
        let mut state = self.lock();
        if state.credential != persisted {
            state.latest_request += 1;
            state.credential = persisted;
            state.identity = None;
            if state.status != HydrationStatus::Uninitialized {
                state.status = HydrationStatus::Absent;
            }
            self.publish(&state);
        }
        debug!(found, "Restored persisted credential");
        found
    }

    /// Application bootstrap: restore the persisted credential and hydrate.
    pub async fn bootstrap(&self) -> HydrationOutcome {
        self.restore();
        self.fetch_current_user().await
    }

    /// Adopts a freshly issued credential and hydrates it.
    ///
    /// Never fails: the outcome reports how hydration ended.
    pub async fn login(&self, credential: Credential) -> HydrationOutcome {
        {
            let mut state = self.lock();
            self.store.save(&credential);
            state.credential = Some(credential);
            state.identity = None;
            state.failure = None;
        }
        self.fetch_current_user().await
    }

    /// The password login flow: obtain a credential, then `login` with it.
    ///
    /// # Errors
    ///
    /// - `InvalidPassword` if the server refuses the password
    /// - `TransientFailure` if the login call fails otherwise
    /// - `MalformedCredential` if the issued credential cannot be decoded
    ///
    /// The current session is untouched in every error case.
    #[instrument(skip_all)]
    pub async fn sign_in(&self, password: &str) -> Result<HydrationOutcome, SessionError> {
        let credential = match self.api.issue_credential(password).await {
            Ok(credential) => credential,
            Err(e) if e.is_authorization_rejection() => {
                debug!("Password rejected");
                return Err(SessionError::InvalidPassword);
            }
            Err(e) => {
                warn!(error = %e, "Login call failed");
                return Err(SessionError::TransientFailure {
                    reason: e.to_string(),
                });
            }
        };

        let claims = decoder::decode(&credential)?;
        info!(user_id = %claims.subject_id(), role = %claims.role(), "Credential issued");

        Ok(self.login(credential).await)
    }

    /// Ends the session: clears the stored credential and the identity.
    ///
    /// Idempotent. Any hydration still in flight is discarded on arrival.
    pub fn logout(&self) {
        let mut state = self.lock();
        let was_active = state.credential.is_some() || state.identity.is_some();
        self.tear_down(&mut state, None);
        if was_active {
            info!("Logged out");
        }
    }

    /// Ends the session because the server rejected the credential.
    ///
    /// Same teardown as `logout`, but records the failure so the user is asked
    /// to log in again.
    pub fn expire(&self) {
        let mut state = self.lock();
        warn!("Credential rejected; ending session");
        self.tear_down(&mut state, Some(SessionFailure::Rejected));
    }

    /// Ends the session of an admin with nowhere to land.
    ///
    /// Same teardown as `logout`, recording why so the login page can say so.
    pub fn end_without_landing_view(&self, user_id: UserId) {
        let mut state = self.lock();
        warn!(%user_id, "Admin has no routable capability; ending session");
        self.tear_down(&mut state, Some(SessionFailure::NoLandingView { user_id }));
    }

    /// Hydrates the session from the server.
    ///
    /// With no credential the session becomes absent; this is not an error.
    #[instrument(skip(self))]
    pub async fn fetch_current_user(&self) -> HydrationOutcome {
        let ticket = match self.begin_hydration() {
            Hydration::Pending(ticket) => ticket,
            Hydration::Settled(outcome) => return outcome,
        };
        let result = self.api.who_am_i(ticket.credential()).await;
        self.complete_hydration(ticket, result)
    }

    /// First half of a hydration: supersedes any attempt in flight, rejects an
    /// undecodable or expired credential locally, and marks the session as
    /// hydrating.
    pub fn begin_hydration(&self) -> Hydration {
        let mut state = self.lock();
        state.latest_request += 1;
        let request_id = state.latest_request;

        let Some(credential) = state.credential.clone() else {
            state.identity = None;
            state.status = HydrationStatus::Absent;
            self.publish(&state);
            debug!(request_id, "No credential; session absent");
            return Hydration::Settled(HydrationOutcome::NoCredential);
        };

        let claims = match decoder::decode(&credential) {
            Ok(claims) => claims,
            Err(e) => {
                warn!(request_id, reason = %e.reason, "Stored credential is malformed");
                self.tear_down(&mut state, Some(SessionFailure::Malformed));
                return Hydration::Settled(HydrationOutcome::Malformed);
            }
        };

        if claims.is_expired_at(Utc::now(), self.expiry_leeway) {
            info!(
                request_id,
                user_id = %claims.subject_id(),
                expired_at = %claims.expires_at(),
                "Stored credential has expired"
            );
            self.tear_down(&mut state, Some(SessionFailure::Expired));
            return Hydration::Settled(HydrationOutcome::Expired);
        }

        state.status = HydrationStatus::Hydrating;
        self.publish(&state);
        debug!(request_id, user_id = %claims.subject_id(), "Hydration started");

        Hydration::Pending(HydrationTicket {
            request_id,
            credential,
        })
    }

    /// Second half of a hydration: applies the server's answer unless a newer
    /// attempt, login or logout superseded the ticket.
    pub fn complete_hydration(
        &self,
        ticket: HydrationTicket,
        result: Result<Identity, ApiError>,
    ) -> HydrationOutcome {
        let mut state = self.lock();
        if ticket.request_id != state.latest_request {
            debug!(
                request_id = ticket.request_id,
                latest = state.latest_request,
                "Discarding superseded hydration result"
            );
            return HydrationOutcome::Superseded;
        }

        match result {
            Ok(identity) => {
                info!(
                    request_id = ticket.request_id,
                    user_id = %identity.id(),
                    role = %identity.role(),
                    "Session hydrated"
                );
                state.identity = Some(identity);
                state.status = HydrationStatus::Hydrated;
                state.failure = None;
                self.publish(&state);
                HydrationOutcome::Hydrated
            }
            Err(e) if e.is_authorization_rejection() => {
                warn!(request_id = ticket.request_id, "Credential rejected during hydration");
                self.tear_down(&mut state, Some(SessionFailure::Rejected));
                HydrationOutcome::Rejected
            }
            Err(e) => {
                warn!(
                    request_id = ticket.request_id,
                    error = %e,
                    "Hydration failed; keeping credential for retry"
                );
                state.identity = None;
                state.status = HydrationStatus::Absent;
                state.failure = Some(SessionFailure::Transient {
                    reason: e.to_string(),
                });
                self.publish(&state);
                HydrationOutcome::Transient
            }
        }
    }

    /// Runs an authenticated API call with the current credential.
    ///
    /// An authorization rejection from any call ends the session, provided the
    /// credential used is still the current one.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` without calling if there is no
    /// credential, otherwise the call's own error.
    pub async fn authorized<T, F, Fut>(&self, call: F) -> Result<T, ApiError>
    where
        F: FnOnce(Credential) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let Some(credential) = self.credential() else {
            return Err(ApiError::Unauthorized);
        };

        let result = call(credential.clone()).await;
        if matches!(&result, Err(e) if e.is_authorization_rejection()) {
            let mut state = self.lock();
            if state.credential.as_ref() == Some(&credential) {
                warn!("Credential rejected by API call; ending session");
                self.tear_down(&mut state, Some(SessionFailure::Rejected));
            }
        }
        result
    }

    /// Returns the hydrated identity, if any.
    #[must_use]
    pub fn current_identity(&self) -> Option<Identity> {
        self.lock().identity.clone()
    }

    /// Returns true while a hydration is in flight.
    #[must_use]
    pub fn is_hydrating(&self) -> bool {
        self.lock().status == HydrationStatus::Hydrating
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub fn status(&self) -> HydrationStatus {
        self.lock().status
    }

    /// Returns the current credential, if any.
    #[must_use]
    pub fn credential(&self) -> Option<Credential> {
        self.lock().credential.clone()
    }

    /// Returns a consistent copy of the session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    /// Returns a receiver that observes every session transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn tear_down(&self, state: &mut SessionState, failure: Option<SessionFailure>) {
        self.store.clear();
        state.latest_request += 1;
        state.credential = None;
        state.identity = None;
        state.status = HydrationStatus::Absent;
        state.failure = failure;
        self.publish(state);
    }

    fn publish(&self, state: &SessionState) {
        let next = state.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{AdminCapabilities, Capability};
    use crate::decoder::fixtures::{credential_for, credential_from_payload, valid_credential};
    use crate::identity::{Profile, StudentProfile};
    use crate::store::MemoryCredentialStore;
    use async_trait::async_trait;
    use ghars_core::{ClassId, UserId};
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    type Reply = Result<Identity, ApiError>;

    enum Scripted {
        Now(Reply),
        Later(oneshot::Receiver<Reply>),
    }

    /// Answers "who am I" calls from a script, in order.
    #[derive(Default)]
    struct FakeApi {
        passwords: Mutex<HashMap<String, Result<Credential, ApiError>>>,
        replies: Mutex<VecDeque<Scripted>>,
        calls: AtomicUsize,
    }

    impl FakeApi {
        fn reply(&self, reply: Reply) {
            self.replies
                .lock()
                .unwrap()
                .push_back(Scripted::Now(reply));
        }

        fn reply_later(&self) -> oneshot::Sender<Reply> {
            let (tx, rx) = oneshot::channel();
            self.replies
                .lock()
                .unwrap()
                .push_back(Scripted::Later(rx));
            tx
        }

        fn accept_password(&self, password: &str, result: Result<Credential, ApiError>) {
            self.passwords
                .lock()
                .unwrap()
                .insert(password.to_string(), result);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SessionApi for FakeApi {
        async fn issue_credential(&self, password: &str) -> Result<Credential, ApiError> {
            let result = self.passwords.lock().unwrap().get(password).cloned();
            result.unwrap_or(Err(ApiError::Unauthorized))
        }

        async fn who_am_i(&self, _credential: &Credential) -> Result<Identity, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let scripted = self.replies.lock().unwrap().pop_front();
            match scripted.expect("unexpected who_am_i call") {
                Scripted::Now(reply) => reply,
                Scripted::Later(rx) => rx.await.expect("reply sender dropped"),
            }
        }
    }

    fn manager() -> SessionManager<FakeApi, MemoryCredentialStore> {
        SessionManager::new(FakeApi::default(), MemoryCredentialStore::new())
    }

    fn student(points: i64) -> Identity {
        Identity::student(UserId::new(7), "Salman", points)
    }

    fn network_down() -> ApiError {
        ApiError::Network {
            reason: "connection refused".to_string(),
        }
    }

    async fn wait_for_calls(api: &FakeApi, calls: usize) {
        while api.calls() < calls {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn fetch_without_credential_is_absent_not_an_error() {
        let manager = manager();
        assert_eq!(manager.status(), HydrationStatus::Uninitialized);

        let outcome = manager.fetch_current_user().await;

        assert_eq!(outcome, HydrationOutcome::NoCredential);
        assert_eq!(manager.status(), HydrationStatus::Absent);
        assert!(manager.current_identity().is_none());
        assert_eq!(manager.api().calls(), 0);
    }

    #[tokio::test]
    async fn login_persists_and_hydrates() {
        let manager = manager();
        let credential = valid_credential(7, "student");
        manager.api().reply(Ok(student(40)));

        let outcome = manager.login(credential.clone()).await;

        assert_eq!(outcome, HydrationOutcome::Hydrated);
        assert_eq!(manager.status(), HydrationStatus::Hydrated);
        assert_eq!(manager.current_identity(), Some(student(40)));
        assert_eq!(manager.store().load(), Some(credential.clone()));
        assert_eq!(manager.credential(), Some(credential));
    }

    #[tokio::test]
    async fn logout_tears_down_identity_and_storage_together() {
        let manager = manager();
        manager.api().reply(Ok(student(40)));
        manager.login(valid_credential(7, "student")).await;

        manager.logout();

        assert!(manager.current_identity().is_none());
        assert!(manager.credential().is_none());
        assert!(manager.store().load().is_none());
        assert_eq!(manager.status(), HydrationStatus::Absent);
        assert!(manager.snapshot().failure.is_none());
    }

    #[test]
    fn logout_without_session_is_a_no_op() {
        let manager = manager();
        manager.logout();
        manager.logout();

        assert!(manager.current_identity().is_none());
        assert!(manager.store().load().is_none());
        assert!(manager.snapshot().failure.is_none());
    }

    #[test]
    fn logout_clears_a_credential_that_was_never_restored() {
        let manager = SessionManager::new(
            FakeApi::default(),
            MemoryCredentialStore::with_credential(valid_credential(7, "student")),
        );

        manager.logout();

        assert!(manager.store().load().is_none());
    }

    #[tokio::test]
    async fn admin_without_landing_view_is_logged_out_with_a_reason() {
        let manager = manager();
        let admin = Identity::admin(UserId::new(1), "Head", AdminCapabilities::none());
        manager.api().reply(Ok(admin));
        manager.login(valid_credential(1, "admin")).await;

        manager.end_without_landing_view(UserId::new(1));

        let snapshot = manager.snapshot();
        assert_eq!(snapshot.status, HydrationStatus::Absent);
        assert!(snapshot.identity.is_none());
        assert!(manager.store().load().is_none());
        let failure = snapshot.failure.expect("failure recorded");
        assert!(!failure.is_retryable());
        assert_eq!(
            failure.to_error(),
            SessionError::PermissionExhausted {
                user_id: UserId::new(1)
            }
        );
        assert_eq!(failure.to_error().user_message(), "Please log in again.");
    }

    #[tokio::test]
    async fn rejection_during_hydration_logs_out() {
        let manager = manager();
        manager.api().reply(Err(ApiError::Unauthorized));

        let outcome = manager.login(valid_credential(7, "student")).await;

        assert_eq!(outcome, HydrationOutcome::Rejected);
        assert_eq!(manager.status(), HydrationStatus::Absent);
        assert!(manager.current_identity().is_none());
        assert!(manager.credential().is_none());
        assert!(manager.store().load().is_none());
        assert_eq!(manager.snapshot().failure, Some(SessionFailure::Rejected));
    }

    #[tokio::test]
    async fn transient_failure_keeps_credential_for_retry() {
        let manager = manager();
        let credential = valid_credential(7, "student");
        manager.api().reply(Err(network_down()));

        let outcome = manager.login(credential.clone()).await;

        assert_eq!(outcome, HydrationOutcome::Transient);
        assert_eq!(manager.status(), HydrationStatus::Absent);
        assert!(manager.current_identity().is_none());
        assert_eq!(manager.store().load(), Some(credential.clone()));
        assert_eq!(manager.credential(), Some(credential));
        let failure = manager.snapshot().failure.expect("failure recorded");
        assert!(failure.is_retryable());

        manager.api().reply(Ok(student(40)));
        assert_eq!(
            manager.fetch_current_user().await,
            HydrationOutcome::Hydrated
        );
        assert_eq!(manager.current_identity(), Some(student(40)));
        assert!(manager.snapshot().failure.is_none());
    }

    #[tokio::test]
    async fn server_fault_is_transient_too() {
        let manager = manager();
        manager.api().reply(Err(ApiError::Status {
            status: 500,
            detail: "internal error".to_string(),
        }));

        let outcome = manager.login(valid_credential(7, "student")).await;

        assert_eq!(outcome, HydrationOutcome::Transient);
        assert!(manager.store().load().is_some());
    }

    #[tokio::test]
    async fn malformed_stored_credential_is_dropped_without_a_round_trip() {
        let manager = SessionManager::new(
            FakeApi::default(),
            MemoryCredentialStore::with_credential(Credential::new("not-a-token")),
        );

        let outcome = manager.bootstrap().await;

        assert_eq!(outcome, HydrationOutcome::Malformed);
        assert_eq!(manager.api().calls(), 0);
        assert!(manager.store().load().is_none());
        assert!(manager.credential().is_none());
        assert_eq!(manager.snapshot().failure, Some(SessionFailure::Malformed));
        assert!(manager.snapshot().failure.unwrap().to_error().requires_login());
    }

    #[tokio::test]
    async fn expired_stored_credential_is_dropped_without_a_round_trip() {
        let expired = credential_for(7, "student", Utc::now() - Duration::hours(2));
        let manager = SessionManager::new(
            FakeApi::default(),
            MemoryCredentialStore::with_credential(expired),
        );

        let outcome = manager.bootstrap().await;

        assert_eq!(outcome, HydrationOutcome::Expired);
        assert_eq!(manager.api().calls(), 0);
        assert!(manager.store().load().is_none());
        assert_eq!(manager.snapshot().failure, Some(SessionFailure::Expired));
    }

    #[tokio::test]
    async fn expiry_within_leeway_still_asks_the_server() {
        let recent = credential_for(7, "student", Utc::now() - Duration::seconds(10));
        let manager = SessionManager::new(
            FakeApi::default(),
            MemoryCredentialStore::with_credential(recent),
        );
        manager.api().reply(Err(ApiError::Unauthorized));

        assert_eq!(manager.bootstrap().await, HydrationOutcome::Rejected);
        assert_eq!(manager.api().calls(), 1);
    }

    #[tokio::test]
    async fn restore_from_wiped_storage_drops_the_identity() {
        let manager = manager();
        manager.api().reply(Ok(student(40)));
        manager.login(valid_credential(7, "student")).await;

        manager.store().clear();
        assert!(!manager.restore());

        let snapshot = manager.snapshot();
        assert_eq!(snapshot.status, HydrationStatus::Absent);
        assert!(snapshot.identity.is_none());
        assert!(!snapshot.has_credential);
    }

    #[tokio::test]
    async fn restore_of_the_same_credential_keeps_the_session() {
        let manager = manager();
        manager.api().reply(Ok(student(40)));
        manager.login(valid_credential(7, "student")).await;

        assert!(manager.restore());

        assert_eq!(manager.status(), HydrationStatus::Hydrated);
        assert_eq!(manager.current_identity(), Some(student(40)));
    }

    #[test]
    fn restore_of_another_credential_supersedes_pending_hydration() {
        let manager = SessionManager::new(
            FakeApi::default(),
            MemoryCredentialStore::with_credential(valid_credential(7, "student")),
        );
        manager.restore();
        let Hydration::Pending(ticket) = manager.begin_hydration() else {
            panic!("expected a pending hydration");
        };

        let other = valid_credential(8, "student");
        manager.store().save(&other);
        assert!(manager.restore());
        let outcome = manager.complete_hydration(ticket, Ok(student(40)));

        assert_eq!(outcome, HydrationOutcome::Superseded);
        assert!(manager.current_identity().is_none());
        assert_eq!(manager.credential(), Some(other));
        assert_eq!(manager.status(), HydrationStatus::Absent);
    }

    #[tokio::test]
    async fn far_future_expiry_hydrates_normally() {
        let manager = SessionManager::new(
            FakeApi::default(),
            MemoryCredentialStore::with_credential(credential_from_payload(serde_json::json!({
                "id": "7",
                "role": "student",
                "exp": 8_210_266_876_799_i64,
            }))),
        );
        manager.api().reply(Ok(student(40)));

        assert_eq!(manager.bootstrap().await, HydrationOutcome::Hydrated);
        assert_eq!(manager.current_identity(), Some(student(40)));
    }

    #[tokio::test]
    async fn bootstrap_restores_and_hydrates() {
        let credential = valid_credential(7, "student");
        let manager = SessionManager::new(
            FakeApi::default(),
            MemoryCredentialStore::with_credential(credential.clone()),
        );
        manager.api().reply(Ok(student(40)));

        assert_eq!(manager.bootstrap().await, HydrationOutcome::Hydrated);
        assert_eq!(manager.credential(), Some(credential));
        assert_eq!(manager.current_identity().and_then(|i| i.points()), Some(40));
    }

    #[test]
    fn stale_response_after_logout_is_discarded() {
        let manager = manager();
        manager.store().save(&valid_credential(7, "student"));
        manager.restore();

        let Hydration::Pending(ticket) = manager.begin_hydration() else {
            panic!("expected a pending hydration");
        };
        assert!(manager.is_hydrating());

        manager.logout();
        let outcome = manager.complete_hydration(ticket, Ok(student(40)));

        assert_eq!(outcome, HydrationOutcome::Superseded);
        assert!(manager.current_identity().is_none());
        assert_eq!(manager.status(), HydrationStatus::Absent);
        assert!(manager.store().load().is_none());
    }

    #[tokio::test]
    async fn login_then_logout_before_response_stays_logged_out() {
        let manager = manager();
        let reply = manager.api().reply_later();

        let login = manager.login(valid_credential(7, "student"));
        let interrupt = async {
            wait_for_calls(manager.api(), 1).await;
            manager.logout();
            reply.send(Ok(student(40))).expect("login still waiting");
        };
        let (outcome, ()) = tokio::join!(login, interrupt);

        assert_eq!(outcome, HydrationOutcome::Superseded);
        assert!(manager.current_identity().is_none());
        assert!(manager.credential().is_none());
        assert!(manager.store().load().is_none());
    }

    #[tokio::test]
    async fn latest_login_wins_over_slower_earlier_one() {
        let manager = manager();
        let first_reply = manager.api().reply_later();
        let admin = Identity::admin(
            UserId::new(1),
            "Head",
            AdminCapabilities::none().with(Capability::ManagePoints),
        );
        manager.api().reply(Ok(admin.clone()));

        let first = manager.login(valid_credential(7, "student"));
        let second = async {
            wait_for_calls(manager.api(), 1).await;
            let outcome = manager.login(valid_credential(1, "admin")).await;
            first_reply.send(Ok(student(40))).expect("first still waiting");
            outcome
        };
        let (first_outcome, second_outcome) = tokio::join!(first, second);

        assert_eq!(second_outcome, HydrationOutcome::Hydrated);
        assert_eq!(first_outcome, HydrationOutcome::Superseded);
        assert_eq!(manager.current_identity(), Some(admin));
    }

    #[test]
    fn stale_rejection_does_not_end_a_newer_session() {
        let manager = manager();
        manager.store().save(&valid_credential(7, "student"));
        manager.restore();
        let Hydration::Pending(stale) = manager.begin_hydration() else {
            panic!("expected a pending hydration");
        };

        let fresh = valid_credential(1, "admin");
        manager.store().save(&fresh);
        manager.restore();
        let Hydration::Pending(current) = manager.begin_hydration() else {
            panic!("expected a pending hydration");
        };

        assert_eq!(
            manager.complete_hydration(stale, Err(ApiError::Unauthorized)),
            HydrationOutcome::Superseded
        );
        assert_eq!(manager.store().load(), Some(fresh.clone()));
        assert_eq!(manager.credential(), Some(fresh));

        let admin = Identity::admin(UserId::new(1), "Head", AdminCapabilities::all());
        assert_eq!(
            manager.complete_hydration(current, Ok(admin)),
            HydrationOutcome::Hydrated
        );
    }

    #[tokio::test]
    async fn refresh_keeps_identity_visible_while_hydrating() {
        let manager = manager();
        manager.api().reply(Ok(student(40)));
        manager.login(valid_credential(7, "student")).await;

        let Hydration::Pending(ticket) = manager.begin_hydration() else {
            panic!("expected a pending hydration");
        };
        let snapshot = manager.snapshot();
        assert!(snapshot.is_hydrating());
        assert!(snapshot.status.is_pending());
        assert_eq!(snapshot.identity, Some(student(40)));

        manager.complete_hydration(ticket, Ok(student(50)));
        assert_eq!(manager.current_identity(), Some(student(50)));
    }

    #[tokio::test]
    async fn hydration_replaces_identity_wholesale() {
        let manager = manager();
        let with_class = Identity::with_profile(
            UserId::new(7),
            "Salman",
            Profile::Student(StudentProfile {
                points: 40,
                class_id: Some(ClassId::new(2)),
                class_name: Some("7-B".to_string()),
                profile_pic_url: Some("https://cdn.example.test/a.png".to_string()),
            }),
        );
        manager.api().reply(Ok(with_class));
        manager.login(valid_credential(7, "student")).await;

        manager.api().reply(Ok(student(45)));
        manager.fetch_current_user().await;

        let identity = manager.current_identity().expect("hydrated");
        match identity.profile() {
            Profile::Student(profile) => {
                assert_eq!(profile.points, 45);
                assert!(profile.class_id.is_none());
                assert!(profile.class_name.is_none());
                assert!(profile.profile_pic_url.is_none());
            }
            Profile::Admin(_) => panic!("expected student"),
        }
    }

    #[tokio::test]
    async fn login_as_someone_else_drops_previous_identity_immediately() {
        let manager = manager();
        manager.api().reply(Ok(student(40)));
        manager.login(valid_credential(7, "student")).await;

        let reply = manager.api().reply_later();
        let login = manager.login(valid_credential(1, "admin"));
        let observe = async {
            wait_for_calls(manager.api(), 2).await;
            let snapshot = manager.snapshot();
            reply.send(Err(network_down())).expect("login waiting");
            snapshot
        };
        let (_, snapshot) = tokio::join!(login, observe);

        assert!(snapshot.is_hydrating());
        assert!(snapshot.identity.is_none());
    }

    #[tokio::test]
    async fn sign_in_with_valid_password() {
        let manager = manager();
        manager
            .api()
            .accept_password("abc123", Ok(valid_credential(7, "student")));
        manager.api().reply(Ok(student(40)));

        let outcome = manager.sign_in("abc123").await.expect("sign in");

        assert_eq!(outcome, HydrationOutcome::Hydrated);
        assert_eq!(manager.current_identity(), Some(student(40)));
    }

    #[tokio::test]
    async fn sign_in_with_wrong_password_leaves_session_alone() {
        let manager = manager();
        manager.api().reply(Ok(student(40)));
        let credential = valid_credential(7, "student");
        manager.login(credential.clone()).await;

        let err = manager.sign_in("wrong").await.unwrap_err();

        assert_eq!(err, SessionError::InvalidPassword);
        assert_eq!(manager.credential(), Some(credential));
        assert_eq!(manager.status(), HydrationStatus::Hydrated);
    }

    #[tokio::test]
    async fn sign_in_network_failure_is_transient() {
        let manager = manager();
        manager.api().accept_password("abc123", Err(network_down()));

        let err = manager.sign_in("abc123").await.unwrap_err();

        assert!(matches!(err, SessionError::TransientFailure { .. }));
        assert!(manager.store().load().is_none());
    }

    #[tokio::test]
    async fn sign_in_refuses_an_undecodable_credential() {
        let manager = manager();
        manager
            .api()
            .accept_password("abc123", Ok(Credential::new("garbage")));

        let err = manager.sign_in("abc123").await.unwrap_err();

        assert!(matches!(err, SessionError::MalformedCredential { .. }));
        assert!(manager.store().load().is_none());
        assert_eq!(manager.api().calls(), 0);
    }

    #[tokio::test]
    async fn rejected_domain_call_ends_the_session() {
        let manager = manager();
        manager.api().reply(Ok(student(40)));
        manager.login(valid_credential(7, "student")).await;

        let result: Result<(), _> = manager
            .authorized(|_| async { Err(ApiError::Unauthorized) })
            .await;

        assert_eq!(result, Err(ApiError::Unauthorized));
        assert!(manager.current_identity().is_none());
        assert!(manager.store().load().is_none());
        assert_eq!(manager.snapshot().failure, Some(SessionFailure::Rejected));
    }

    #[tokio::test]
    async fn forbidden_domain_call_keeps_the_session() {
        let manager = manager();
        manager.api().reply(Ok(student(40)));
        manager.login(valid_credential(7, "student")).await;

        let result: Result<(), _> = manager
            .authorized(|_| async {
                Err(ApiError::Forbidden {
                    detail: "Not enough permissions".to_string(),
                })
            })
            .await;

        assert!(matches!(result, Err(ApiError::Forbidden { .. })));
        assert_eq!(manager.status(), HydrationStatus::Hydrated);
        assert!(manager.store().load().is_some());
    }

    #[tokio::test]
    async fn authorized_call_receives_current_credential() {
        let manager = manager();
        let credential = valid_credential(7, "student");
        manager.api().reply(Ok(student(40)));
        manager.login(credential.clone()).await;

        let seen = manager
            .authorized(|c| async move { Ok(c) })
            .await
            .expect("call");

        assert_eq!(seen, credential);
    }

    #[tokio::test]
    async fn authorized_without_credential_does_not_call() {
        let manager = manager();
        let called = AtomicUsize::new(0);

        let result: Result<(), _> = manager
            .authorized(|_| {
                called.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            })
            .await;

        assert_eq!(result, Err(ApiError::Unauthorized));
        assert_eq!(called.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn subscribers_observe_transitions() {
        let manager = manager();
        let mut snapshots = manager.subscribe();
        assert_eq!(snapshots.borrow_and_update().status, HydrationStatus::Uninitialized);

        manager.api().reply(Ok(student(40)));
        manager.login(valid_credential(7, "student")).await;

        assert!(snapshots.has_changed().expect("sender alive"));
        let snapshot = snapshots.borrow_and_update().clone();
        assert_eq!(snapshot.status, HydrationStatus::Hydrated);
        assert!(snapshot.has_credential);

        manager.logout();
        assert!(snapshots.has_changed().expect("sender alive"));
        assert!(snapshots.borrow_and_update().identity.is_none());

        manager.logout();
        assert!(!snapshots.has_changed().expect("sender alive"));
    }
}
