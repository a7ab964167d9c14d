//! Core library for tenantdesk.
//!
//! This crate owns the client-side session lifecycle:
//! - `token`: decode the expiry of an access token
//! - `store`: mirror the session record to durable storage (file, keychain, memory)
//! - `api`: the remote auth service seam and its HTTP implementation
//! - `auth`: the session lifecycle manager with single-flight token refresh
//! - `guard`: route guards that gate protected content on the session
//! - `config`: application configuration

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod guard;
pub mod store;
pub mod token;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{AuthService, HttpAuthService, RemoteAuthError};
pub use auth::{
    AuthError, AuthResult, Credentials, ErrorClass, OAuthCallback, SessionManager, SessionRecord,
    SessionState, TokenPair, UserProfile,
};
pub use config::{Config, StorageKind};
pub use guard::{GuardDecision, Navigator, Redirect, RouteGuard};
pub use store::{SessionStore, StorageBackend, StorageError};
