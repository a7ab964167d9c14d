//! Authentication error types.

use thiserror::Error;

use crate::api::RemoteAuthError;
use crate::store::StorageError;

/// Authentication error type.
///
/// `Clone` because a single refresh outcome is handed to every caller that
/// was waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Access token could not be decoded
    #[error("Malformed access token: {0}")]
    MalformedToken(String),

    /// Operation needs a session but none is held
    #[error("Not signed in")]
    NoSession,

    /// Error returned by the auth service (sign-in, refresh, code exchange)
    #[error(transparent)]
    Remote(#[from] RemoteAuthError),

    /// Persisted store failure. Never escapes the store.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// How a caller should react to an error from an authenticated remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transient or unrelated to the session; keep the session.
    Recoverable,
    /// The session itself is invalid; re-authenticate.
    Fatal,
}

impl AuthError {
    pub fn classify(&self) -> ErrorClass {
        match self {
            AuthError::NoSession => ErrorClass::Fatal,
            AuthError::Remote(remote) if remote.is_unauthorized() || remote.is_session_missing() => {
                ErrorClass::Fatal
            }
            AuthError::Remote(_) | AuthError::MalformedToken(_) | AuthError::Storage(_) => {
                ErrorClass::Recoverable
            }
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.classify() == ErrorClass::Fatal
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(status: Option<u16>, detail: &str) -> AuthError {
        RemoteAuthError::new(status, detail).into()
    }

    #[test]
    fn test_unauthorized_is_fatal() {
        assert_eq!(remote(Some(401), "expired").classify(), ErrorClass::Fatal);
    }

    #[test]
    fn test_forbidden_is_fatal() {
        assert_eq!(remote(Some(403), "nope").classify(), ErrorClass::Fatal);
    }

    #[test]
    fn test_session_missing_is_fatal() {
        assert_eq!(remote(Some(400), "Auth session missing!").classify(), ErrorClass::Fatal);
        assert_eq!(remote(None, "auth session missing").classify(), ErrorClass::Fatal);
    }

    #[test]
    fn test_no_session_is_fatal() {
        assert!(AuthError::NoSession.is_fatal());
    }

    #[test]
    fn test_server_error_is_recoverable() {
        assert_eq!(remote(Some(502), "bad gateway").classify(), ErrorClass::Recoverable);
    }

    #[test]
    fn test_network_error_is_recoverable() {
        assert_eq!(remote(None, "connection refused").classify(), ErrorClass::Recoverable);
    }

    #[test]
    fn test_not_found_is_recoverable() {
        assert!(!remote(Some(404), "no such project").is_fatal());
    }

    #[test]
    fn test_storage_error_is_recoverable() {
        let err: AuthError = StorageError::Unavailable("quota exceeded".to_string()).into();
        assert_eq!(err.classify(), ErrorClass::Recoverable);
    }
}
