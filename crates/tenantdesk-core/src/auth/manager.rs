//! Session lifecycle manager.
//!
//! The manager owns the in-memory session record and moves it between three
//! states: `Anonymous`, `Authenticated`, and the transient `Refreshing`. Every
//! mutation is mirrored to the `SessionStore` before the lock is released, so
//! the store always reflects the latest in-memory transition.
//!
//! Token refresh is single-flight: the first caller that finds the access token
//! stale spawns the exchange as its own task and memoizes a shared handle to
//! the result. Callers arriving while it is in flight await that same handle.
//! The task applies the resulting transition itself, so it completes even if
//! every caller has gone away.
//!
//! Must be used from within a Tokio runtime.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use super::{AuthError, AuthResult, Credentials, ErrorClass, OAuthCallback, SessionRecord, SessionState};
use crate::api::{AuthService, RemoteAuthError};
use crate::clock::{Clock, SystemClock};
use crate::store::SessionStore;
use crate::token;

type RefreshOutcome = AuthResult<SessionRecord>;
type PendingRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

#[derive(Default)]
struct Inner {
    record: Option<SessionRecord>,
    in_flight: Option<PendingRefresh>,
    /// Bumped whenever the session is replaced outside of a refresh. A refresh
    /// that started under an older generation must not apply its result.
    generation: u64,
}

struct Core {
    service: Arc<dyn AuthService>,
    store: SessionStore,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
}

impl Core {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the session outright (login, logout) and persist it.
    fn replace(&self, record: Option<SessionRecord>) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.in_flight = None;
        self.store.write(record.as_ref());
        inner.record = record;
    }

    fn settle_refresh(&self, generation: u64, outcome: RefreshOutcome) -> RefreshOutcome {
        let outcome = outcome.and_then(ensure_complete);

        let mut inner = self.lock();
        if inner.generation != generation {
            debug!("Session replaced during refresh, discarding refresh result");
            return outcome;
        }

        inner.in_flight = None;
        match &outcome {
            Ok(record) => {
                self.store.write(Some(record));
                inner.record = Some(record.clone());
                info!(user_id = %record.user.id, "Access token refreshed");
            }
            Err(e) => {
                self.store.write(None);
                inner.record = None;
                warn!(error = %e, "Token refresh failed, session cleared");
            }
        }
        outcome
    }

    /// Drop the memo of a refresh task that died without settling.
    fn abandon_refresh(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation == generation {
            inner.in_flight = None;
        }
    }

    fn spawn_refresh(core: &Arc<Core>, refresh_token: String, generation: u64) -> PendingRefresh {
        let task_core = Arc::clone(core);
        let task = tokio::spawn(async move {
            let outcome = task_core.service.refresh(&refresh_token).await;
            task_core.settle_refresh(generation, outcome)
        });

        let watcher = Arc::clone(core);
        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(error = %e, "Refresh task did not complete");
                    watcher.abandon_refresh(generation);
                    Err(RemoteAuthError::new(None, format!("refresh task failed: {}", e)).into())
                }
            }
        }
        .boxed()
        .shared()
    }
}

fn ensure_complete(record: SessionRecord) -> RefreshOutcome {
    if record.is_complete() {
        Ok(record)
    } else {
        Err(RemoteAuthError::invalid_response("incomplete session record").into())
    }
}

/// Handle to the session. Clone is cheap and every clone shares one session,
/// so hand clones to the consumers that need it.
#[derive(Clone)]
pub struct SessionManager {
    core: Arc<Core>,
}

impl SessionManager {
    pub fn new(service: Arc<dyn AuthService>, store: SessionStore) -> Self {
        Self::with_clock(service, store, Arc::new(SystemClock))
    }

    pub fn with_clock(service: Arc<dyn AuthService>, store: SessionStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            core: Arc::new(Core {
                service,
                store,
                clock,
                inner: Mutex::new(Inner::default()),
            }),
        }
    }

    /// Load the persisted session, if any. Call once at start-up.
    ///
    /// An expired record is still loaded; the next check refreshes it.
    pub fn init(&self) -> SessionState {
        let persisted = self.core.store.read();
        let mut inner = self.core.lock();
        inner.generation += 1;
        inner.in_flight = None;
        inner.record = persisted;
        info!(authenticated = inner.record.is_some(), "Session manager initialized");
        Self::state_of(&inner)
    }

    /// The held record, without checking expiry.
    pub fn current(&self) -> Option<SessionRecord> {
        self.core.lock().record.clone()
    }

    pub fn state(&self) -> SessionState {
        Self::state_of(&self.core.lock())
    }

    fn state_of(inner: &Inner) -> SessionState {
        if inner.in_flight.is_some() {
            SessionState::Refreshing
        } else if inner.record.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.core
            .lock()
            .record
            .as_ref()
            .map(|record| record.has_role(role))
            .unwrap_or(false)
    }

    /// Sign in with email and password.
    ///
    /// On failure the session is cleared and the remote error is returned
    /// unchanged.
    pub async fn login(&self, credentials: &Credentials) -> AuthResult<SessionRecord> {
        info!(email = %credentials.email, "Signing in");
        let result = self.core.service.sign_in(credentials).await;
        self.settle_sign_in(result)
    }

    /// Complete an external-provider sign-in from its redirect URL.
    pub async fn login_with_callback(&self, callback_url: &str) -> AuthResult<SessionRecord> {
        let result = match OAuthCallback::parse(callback_url) {
            Ok(callback) => {
                info!(provider = %callback.provider, "Exchanging authorization code");
                self.core
                    .service
                    .exchange_code(&callback.provider, &callback.code)
                    .await
            }
            Err(e) => Err(e),
        };
        self.settle_sign_in(result)
    }

    fn settle_sign_in(&self, result: AuthResult<SessionRecord>) -> AuthResult<SessionRecord> {
        match result.and_then(ensure_complete) {
            Ok(record) => {
                self.core.replace(Some(record.clone()));
                info!(user_id = %record.user.id, roles = ?record.user.roles, "Signed in");
                Ok(record)
            }
            Err(e) => {
                warn!(error = %e, "Sign-in failed");
                self.core.replace(None);
                Err(e)
            }
        }
    }

    /// Forget the session in memory and in the store. Idempotent.
    pub fn logout(&self) {
        self.core.replace(None);
        info!("Signed out");
    }

    /// Ensure the held session, if any, has a non-expired access token.
    pub async fn check_auth(&self) -> AuthResult<SessionRecord> {
        self.get_or_refresh_token().await
    }

    /// Return the held record, refreshing it first if the access token is stale.
    ///
    /// Concurrent callers during a refresh all observe the same outcome; only
    /// one exchange is ever in flight. A failed refresh clears the session.
    pub async fn get_or_refresh_token(&self) -> AuthResult<SessionRecord> {
        let pending = {
            let mut inner = self.core.lock();
            if let Some(pending) = inner.in_flight.as_ref() {
                debug!("Joining in-flight token refresh");
                pending.clone()
            } else {
                let record = inner.record.clone().ok_or(AuthError::NoSession)?;
                let now = self.core.clock.now();
                match token::decode_expiry(&record.tokens.access_token) {
                    Ok(expires_at) if token::is_fresh(expires_at, now) => {
                        debug!(expires_in = expires_at.saturating_sub(now), "Access token still valid");
                        return Ok(record);
                    }
                    Ok(expires_at) => info!(
                        expired_for = now.saturating_sub(expires_at),
                        "Access token expired, refreshing"
                    ),
                    Err(e) => warn!(error = %e, "Access token unreadable, refreshing"),
                }

                let pending = Core::spawn_refresh(
                    &self.core,
                    record.tokens.refresh_token.clone(),
                    inner.generation,
                );
                inner.in_flight = Some(pending.clone());
                pending
            }
        };
        pending.await
    }

    /// Classify an error from an authenticated remote call.
    pub fn check_error(&self, error: &AuthError) -> ErrorClass {
        error.classify()
    }

    /// Classify an error and sign out when it shows the session is invalid.
    pub fn handle_error(&self, error: &AuthError) -> ErrorClass {
        let class = self.check_error(error);
        if class == ErrorClass::Fatal {
            warn!(error = %error, "Session rejected by server, signing out");
            self.logout();
        }
        class
    }
}
