//! Durable mirror of the session record.
//!
//! The `SessionStore` keeps the current session under a fixed key so that a
//! restart can resume it. Durability is best-effort: storage failures are
//! logged and swallowed, and the in-memory session keeps working.
//!
//! Backends:
//! - `FileBackend`: one JSON file per key in the cache directory
//! - `KeyringBackend`: OS keychain entry per key
//! - `MemoryBackend`: process-local map
//!
//! Nothing coordinates two processes sharing a backend. Each may refresh on
//! its own and the last write wins.

pub mod backend;
pub mod persisted;

use thiserror::Error;

pub use backend::{FileBackend, KeyringBackend, MemoryBackend, StorageBackend};
pub use persisted::{SessionStore, SESSION_KEY};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("Keychain error: {0}")]
    Keychain(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}
