//! Authentication module for managing the client session.
//!
//! This module provides:
//! - `SessionRecord`: the authenticated identity and its token pair
//! - `SessionManager`: login/logout/check with single-flight token refresh
//! - `OAuthCallback`: parsing of external-provider redirect URLs
//! - `AuthError`: the closed set of errors surfaced to consumers
//!
//! The manager is the source of truth for the session; the persisted store
//! only mirrors it so that a restart can pick the session back up.

pub mod callback;
pub mod error;
pub mod manager;
pub mod session;

pub use callback::OAuthCallback;
pub use error::{AuthError, AuthResult, ErrorClass};
pub use manager::SessionManager;
pub use session::{Credentials, SessionRecord, SessionState, TokenPair, UserProfile};
