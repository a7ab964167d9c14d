use std::sync::Arc;

use tracing::{debug, warn};

use super::{StorageBackend, StorageError};
use crate::auth::{AuthResult, SessionRecord};

/// Fixed key the session record is stored under.
pub const SESSION_KEY: &str = "session";

/// Best-effort persisted mirror of the session record.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn StorageBackend>,
}

impl SessionStore {
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Last persisted record. Missing, corrupt and incomplete values all read
    /// as `None`.
    pub fn read(&self) -> Option<SessionRecord> {
        match self.try_read() {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable persisted session");
                None
            }
        }
    }

    /// `None` clears the persisted record. Failures are logged, never returned.
    pub fn write(&self, record: Option<&SessionRecord>) {
        if let Err(e) = self.try_write(record) {
            warn!(error = %e, cleared = record.is_none(), "Failed to persist session, continuing in memory");
        }
    }

    fn try_read(&self) -> AuthResult<Option<SessionRecord>> {
        let Some(raw) = self.backend.get(SESSION_KEY)? else {
            debug!("No persisted session");
            return Ok(None);
        };

        let record: SessionRecord =
            serde_json::from_str(&raw).map_err(|e| StorageError::Serialization(e.to_string()))?;
        if !record.is_complete() {
            return Err(StorageError::Serialization("persisted session is incomplete".to_string()).into());
        }
        Ok(Some(record))
    }

    fn try_write(&self, record: Option<&SessionRecord>) -> AuthResult<()> {
        match record {
            Some(record) => {
                let raw = serde_json::to_string(record)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                self.backend.set(SESSION_KEY, &raw)?;
            }
            None => self.backend.remove(SESSION_KEY)?,
        }
        Ok(())
    }
}
