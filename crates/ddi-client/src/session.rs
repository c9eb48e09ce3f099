//! Session persistence backends.
//!
//! # Design
//! - One trait, two interchangeable backends, chosen at deployment time.
//! - Stores only hold bytes; the client decides what a restore failure means.
//! - The client is the only writer of the slot.

use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use ddi_api_models::User;
use serde::{Deserialize, Serialize};

use crate::error::SessionStoreError;

const SESSION_DIR: &str = "ddi";
const SESSION_FILE: &str = "session.json";

/// Session state written to the persistence slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistedSession {
    /// Authenticated user.
    pub user: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Bearer token, for deployments that hand the credential to the client.
    pub token: Option<String>,
}

/// Storage slot backing the client's session.
pub trait SessionStore: Send + Sync {
    /// Write `session`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be written.
    fn persist(&self, session: &PersistedSession) -> Result<(), SessionStoreError>;

    /// Read the stored session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot exists but cannot be read or parsed.
    fn restore(&self) -> Result<Option<PersistedSession>, SessionStoreError>;

    /// Remove the stored session. Clearing an empty slot succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be removed.
    fn clear(&self) -> Result<(), SessionStoreError>;
}

impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    fn persist(&self, session: &PersistedSession) -> Result<(), SessionStoreError> {
        (**self).persist(session)
    }

    fn restore(&self) -> Result<Option<PersistedSession>, SessionStoreError> {
        (**self).restore()
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        (**self).clear()
    }
}

/// Durable slot: a JSON file that outlives the process.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Platform default location: `$XDG_STATE_HOME/ddi/session.json`, falling
    /// back to `~/.local/state` and then `%LOCALAPPDATA%`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        let base = env::var_os("XDG_STATE_HOME")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .or_else(|| {
                env::var_os("HOME")
                    .filter(|value| !value.is_empty())
                    .map(|home| PathBuf::from(home).join(".local").join("state"))
            })
            .or_else(|| env::var_os("LOCALAPPDATA").map(PathBuf::from))?;
        Some(base.join(SESSION_DIR).join(SESSION_FILE))
    }

    fn io_error(&self, operation: &'static str, source: std::io::Error) -> SessionStoreError {
        SessionStoreError::Io {
            operation,
            path: self.path.clone(),
            source,
        }
    }
}

impl SessionStore for FileSessionStore {
    fn persist(&self, session: &PersistedSession) -> Result<(), SessionStoreError> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error("create_dir", source))?;
        }
        let payload =
            serde_json::to_vec_pretty(session).map_err(|source| SessionStoreError::Encode { source })?;

        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, payload).map_err(|source| self.io_error("write", source))?;
        restrict_permissions(&staging).map_err(|source| self.io_error("chmod", source))?;
        fs::rename(&staging, &self.path).map_err(|source| self.io_error("rename", source))?;
        Ok(())
    }

    fn restore(&self) -> Result<Option<PersistedSession>, SessionStoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|source| {
                SessionStoreError::Corrupt {
                    path: self.path.clone(),
                    source,
                }
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(self.io_error("read", source)),
        }
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(self.io_error("remove", source)),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Session-scoped slot: lives only as long as the store value itself.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: RwLock<Option<PersistedSession>>,
}

impl MemorySessionStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn persist(&self, session: &PersistedSession) -> Result<(), SessionStoreError> {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn restore(&self) -> Result<Option<PersistedSession>, SessionStoreError> {
        Ok(self
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
