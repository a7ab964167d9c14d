//! Fixtures shared by the unit tests.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::api::{AuthService, RemoteAuthError};
use crate::auth::{AuthResult, Credentials, SessionRecord, TokenPair, UserProfile};
use crate::clock::Clock;
use crate::store::{StorageBackend, StorageError};
use crate::token::testing::mint;

pub(crate) fn record(user_id: &str, exp: i64, refresh_token: &str) -> SessionRecord {
    SessionRecord {
        user: UserProfile {
            id: user_id.to_string(),
            email: None,
            name: None,
            avatar_url: None,
            tenant_id: None,
            roles: Vec::new(),
        },
        tokens: TokenPair {
            access_token: mint(exp),
            refresh_token: refresh_token.to_string(),
        },
    }
}

pub(crate) fn unauthorized() -> crate::auth::AuthError {
    RemoteAuthError::new(Some(401), "Invalid refresh token").into()
}

/// Clock pinned to a settable instant.
pub(crate) struct ManualClock(AtomicI64);

impl ManualClock {
    pub(crate) fn at(now: i64) -> Arc<Self> {
        Arc::new(Self(AtomicI64::new(now)))
    }

    pub(crate) fn set(&self, now: i64) {
        self.0.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Backend where every operation fails, as with a full or disabled disk.
pub(crate) struct FailingBackend;

impl StorageBackend for FailingBackend {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("quota exceeded".to_string()))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }
}

/// Auth service answering from canned responses and counting calls.
pub(crate) struct ScriptedAuthService {
    sign_in_response: Mutex<AuthResult<SessionRecord>>,
    refresh_response: Mutex<AuthResult<SessionRecord>>,
    exchange_response: Mutex<AuthResult<SessionRecord>>,
    refresh_gate: Option<Arc<Notify>>,
    pub(crate) sign_in_calls: AtomicUsize,
    pub(crate) refresh_calls: AtomicUsize,
    pub(crate) exchange_calls: AtomicUsize,
    pub(crate) refresh_tokens_seen: Mutex<Vec<String>>,
    pub(crate) codes_seen: Mutex<Vec<(String, String)>>,
}

impl ScriptedAuthService {
    pub(crate) fn new() -> Self {
        let unscripted = || -> AuthResult<SessionRecord> {
            Err(RemoteAuthError::new(Some(500), "unscripted call").into())
        };
        Self {
            sign_in_response: Mutex::new(unscripted()),
            refresh_response: Mutex::new(unscripted()),
            exchange_response: Mutex::new(unscripted()),
            refresh_gate: None,
            sign_in_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            exchange_calls: AtomicUsize::new(0),
            refresh_tokens_seen: Mutex::new(Vec::new()),
            codes_seen: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn on_sign_in(self, response: AuthResult<SessionRecord>) -> Self {
        *self.sign_in_response.lock().unwrap() = response;
        self
    }

    pub(crate) fn on_refresh(self, response: AuthResult<SessionRecord>) -> Self {
        *self.refresh_response.lock().unwrap() = response;
        self
    }

    pub(crate) fn on_exchange(self, response: AuthResult<SessionRecord>) -> Self {
        *self.exchange_response.lock().unwrap() = response;
        self
    }

    /// Hold every refresh open until the gate is notified.
    pub(crate) fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.refresh_gate = Some(gate);
        self
    }

    pub(crate) fn network_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
            + self.refresh_calls.load(Ordering::SeqCst)
            + self.exchange_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthService for ScriptedAuthService {
    async fn sign_in(&self, _credentials: &Credentials) -> AuthResult<SessionRecord> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        self.sign_in_response.lock().unwrap().clone()
    }

    async fn refresh(&self, refresh_token: &str) -> AuthResult<SessionRecord> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.refresh_tokens_seen
            .lock()
            .unwrap()
            .push(refresh_token.to_string());
        if let Some(gate) = &self.refresh_gate {
            gate.notified().await;
        }
        self.refresh_response.lock().unwrap().clone()
    }

    async fn exchange_code(&self, provider: &str, code: &str) -> AuthResult<SessionRecord> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        self.codes_seen
            .lock()
            .unwrap()
            .push((provider.to_string(), code.to_string()));
        self.exchange_response.lock().unwrap().clone()
    }
}
