//! Session snapshot persistence.
//!
//! Only a whitelisted subset of the session survives a process restart:
//! user, token pair, and the authenticated flag. `last_error` and other
//! transient state are never written. The snapshot is versionless and lives
//! under a single fixed key; anything unreadable loads as "no session".

use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::AuthError;
use crate::models::auth::User;

/// Fixed storage key, shared with the web console.
pub const STORAGE_KEY: &str = "correspondence-auth";

/// The persisted subset of the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    pub user: Option<User>,
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub is_authenticated: bool,
}

/// Durable save/load for session snapshots.
///
/// The session manager writes through on every mutation of a whitelisted
/// field; an external initializer loads once at startup before validating.
pub trait SessionPersister: Send + Sync {
    fn save(&self, snapshot: &PersistedSession) -> Result<(), AuthError>;
    fn load(&self) -> Result<Option<PersistedSession>, AuthError>;
}

impl<P: SessionPersister + ?Sized> SessionPersister for std::sync::Arc<P> {
    fn save(&self, snapshot: &PersistedSession) -> Result<(), AuthError> {
        (**self).save(snapshot)
    }

    fn load(&self) -> Result<Option<PersistedSession>, AuthError> {
        (**self).load()
    }
}

/// File-backed persister: one JSON document per storage key.
pub struct FileSessionPersister {
    path: PathBuf,
}

impl FileSessionPersister {
    /// Persist under an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Persist under the default location:
    /// `<data dir>/correspondencia/correspondence-auth.json`.
    pub fn default_location() -> Self {
        let path = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("correspondencia")
            .join(format!("{STORAGE_KEY}.json"));
        Self { path }
    }

    /// The file this persister writes to.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl SessionPersister for FileSessionPersister {
    fn save(&self, snapshot: &PersistedSession) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AuthError::StorageError(e.to_string()))?;
        }
        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| AuthError::StorageError(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| AuthError::StorageError(e.to_string()))
    }

    fn load(&self) -> Result<Option<PersistedSession>, AuthError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AuthError::StorageError(e.to_string())),
        };
        match serde_json::from_str(&contents) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                // A corrupt snapshot means re-authenticating, never failing
                // startup.
                warn!(path = %self.path.display(), error = %e, "discarding unreadable session snapshot");
                Ok(None)
            }
        }
    }
}

/// In-memory persister for tests and demos.
#[derive(Default)]
pub struct MemorySessionPersister {
    snapshot: Mutex<Option<PersistedSession>>,
}

impl MemorySessionPersister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed the stored snapshot, as if a prior process had written it.
    pub fn with_snapshot(snapshot: PersistedSession) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
        }
    }
}

impl SessionPersister for MemorySessionPersister {
    fn save(&self, snapshot: &PersistedSession) -> Result<(), AuthError> {
        *self
            .snapshot
            .lock()
            .map_err(|_| AuthError::StorageError("persister mutex poisoned".into()))? =
            Some(snapshot.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<PersistedSession>, AuthError> {
        Ok(self
            .snapshot
            .lock()
            .map_err(|_| AuthError::StorageError("persister mutex poisoned".into()))?
            .clone())
    }
}
