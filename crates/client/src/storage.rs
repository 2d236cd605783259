//! Session token persistence.
//!
//! The token is the only state that outlives the process. It is kept in a
//! small JSON key-value file under the key `authToken`, so other keys
//! written by other tools survive a save or a clear.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use c2c_core::AuthToken;
use parking_lot::Mutex;
use thiserror::Error;

/// Key the session token is stored under.
pub const TOKEN_KEY: &str = "authToken";

/// Errors that can occur while reading or writing the token file.
#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("token storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("token storage file {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where the session token lives between runs.
pub trait TokenStore: Send + Sync {
    /// The persisted token, if any.
    ///
    /// # Errors
    ///
    /// Returns `TokenStoreError` if storage exists but cannot be read.
    fn load(&self) -> Result<Option<AuthToken>, TokenStoreError>;

    /// Persist `token`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `TokenStoreError` if storage cannot be written.
    fn save(&self, token: &AuthToken) -> Result<(), TokenStoreError>;

    /// Remove the persisted token. Clearing an empty store succeeds.
    ///
    /// # Errors
    ///
    /// Returns `TokenStoreError` if storage cannot be written.
    fn clear(&self) -> Result<(), TokenStoreError>;
}

/// Token kept in a JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, serde_json::Value>, TokenStoreError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(TokenStoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&text).map_err(|source| TokenStoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write_entries(
        &self,
        entries: &BTreeMap<String, serde_json::Value>,
    ) -> Result<(), TokenStoreError> {
        let io_err = |source| TokenStoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let text = serde_json::to_string_pretty(entries).map_err(|source| {
            TokenStoreError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;
        std::fs::write(&self.path, text).map_err(io_err)?;
        restrict_permissions(&self.path).map_err(io_err)
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<AuthToken>, TokenStoreError> {
        let entries = self.read_entries()?;
        Ok(entries
            .get(TOKEN_KEY)
            .and_then(serde_json::Value::as_str)
            .filter(|token| !token.is_empty())
            .map(AuthToken::new))
    }

    fn save(&self, token: &AuthToken) -> Result<(), TokenStoreError> {
        let mut entries = self.read_entries()?;
        entries.insert(
            TOKEN_KEY.to_owned(),
            serde_json::Value::String(token.expose().to_owned()),
        );
        self.write_entries(&entries)?;
        tracing::debug!(path = %self.path.display(), "Saved session token");
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        let mut entries = self.read_entries()?;
        if entries.remove(TOKEN_KEY).is_none() {
            return Ok(());
        }
        self.write_entries(&entries)?;
        tracing::debug!(path = %self.path.display(), "Cleared session token");
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Token kept in memory only; forgotten when the process exits.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<AuthToken>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a token, as if saved by an earlier run.
    #[must_use]
    pub fn with_token(token: AuthToken) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<AuthToken>, TokenStoreError> {
        Ok(self.token.lock().clone())
    }

    fn save(&self, token: &AuthToken) -> Result<(), TokenStoreError> {
        *self.token.lock() = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        *self.token.lock() = None;
        Ok(())
    }
}
