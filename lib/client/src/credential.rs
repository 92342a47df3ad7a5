//! Persisted credential storage.
//!
//! The dashboard keeps three plain strings between runs: the access token,
//! the refresh token, and the role resolved at login. Stores are key-value
//! only; every policy decision lives in the client and session layers.

use crate::error::CredentialError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tempfile::NamedTempFile;

/// Key of a persisted credential entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKey {
    /// Short-lived token attached to every authenticated request.
    Access,
    /// Longer-lived token used to mint a new access token.
    Refresh,
    /// Role resolved by the backend at login.
    Role,
}

impl CredentialKey {
    /// All keys, in storage order.
    pub const ALL: [CredentialKey; 3] = [Self::Access, Self::Refresh, Self::Role];

    /// Returns the storage name of the key.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
            Self::Role => "role",
        }
    }
}

impl std::fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An access/refresh token pair as issued at login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// The access token.
    pub access: String,
    /// The refresh token.
    pub refresh: String,
}

impl Credentials {
    /// Creates a token pair.
    #[must_use]
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }
}

// Tokens never appear in logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

/// A single mutation applied by [`CredentialStore::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialWrite {
    /// Sets a key to a value.
    Set(CredentialKey, String),
    /// Removes a key.
    Remove(CredentialKey),
}

/// Trait for credential persistence.
///
/// `write` applies a batch of mutations atomically: no reader observes a
/// state where only part of the batch is visible.
pub trait CredentialStore: Send + Sync {
    /// Returns the stored value for a key.
    fn get(&self, key: CredentialKey) -> Option<String>;

    /// Applies a batch of mutations atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the mutations cannot be persisted.
    fn write(&self, changes: Vec<CredentialWrite>) -> Result<(), CredentialError>;

    /// Sets a single key.
    fn set(&self, key: CredentialKey, value: &str) -> Result<(), CredentialError> {
        self.write(vec![CredentialWrite::Set(key, value.to_string())])
    }

    /// Removes a single key.
    fn remove(&self, key: CredentialKey) -> Result<(), CredentialError> {
        self.write(vec![CredentialWrite::Remove(key)])
    }

    /// Removes every stored credential.
    fn clear(&self) -> Result<(), CredentialError> {
        self.write(
            CredentialKey::ALL
                .into_iter()
                .map(CredentialWrite::Remove)
                .collect(),
        )
    }

    /// Stores an access/refresh pair in one step.
    fn store_pair(&self, credentials: &Credentials) -> Result<(), CredentialError> {
        self.write(vec![
            CredentialWrite::Set(CredentialKey::Access, credentials.access.clone()),
            CredentialWrite::Set(CredentialKey::Refresh, credentials.refresh.clone()),
        ])
    }

    /// Returns the access token, treating an empty value as absent.
    fn access_token(&self) -> Option<String> {
        self.get(CredentialKey::Access).filter(|t| !t.is_empty())
    }

    /// Returns the refresh token, treating an empty value as absent.
    fn refresh_token(&self) -> Option<String> {
        self.get(CredentialKey::Refresh).filter(|t| !t.is_empty())
    }

    /// Returns true if a usable access token is stored.
    fn has_access_token(&self) -> bool {
        self.access_token().is_some()
    }
}

type Entries = BTreeMap<CredentialKey, String>;

fn apply(entries: &mut Entries, changes: Vec<CredentialWrite>) {
    for change in changes {
        match change {
            CredentialWrite::Set(key, value) => {
                entries.insert(key, value);
            }
            CredentialWrite::Remove(key) => {
                entries.remove(&key);
            }
        }
    }
}

/// In-process credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: RwLock<Entries>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with a token pair.
    #[must_use]
    pub fn with_credentials(credentials: &Credentials) -> Self {
        let mut entries = Entries::new();
        entries.insert(CredentialKey::Access, credentials.access.clone());
        entries.insert(CredentialKey::Refresh, credentials.refresh.clone());
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: CredentialKey) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    fn write(&self, changes: Vec<CredentialWrite>) -> Result<(), CredentialError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut entries, changes);
        Ok(())
    }
}

/// Credential store persisted as a JSON document on disk.
///
/// The document is rewritten on every mutation and deleted once the store
/// becomes empty.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    entries: RwLock<Entries>,
}

impl FileCredentialStore {
    /// Opens the store at `path`, loading any existing document.
    ///
    /// A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CredentialError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => Entries::new(),
            Ok(text) => {
                serde_json::from_str(&text).map_err(|e| CredentialError::InvalidFormat {
                    reason: e.to_string(),
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Entries::new(),
            Err(e) => {
                return Err(CredentialError::LoadFailed {
                    reason: format!("{}: {e}", path.display()),
                });
            }
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "opened credential store");

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Returns the path of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &Entries) -> Result<(), CredentialError> {
        if entries.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(CredentialError::StorageFailed {
                    reason: format!("{}: {e}", self.path.display()),
                }),
            };
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CredentialError::StorageFailed {
                reason: format!("{}: {e}", parent.display()),
            })?;
        }

        let text =
            serde_json::to_string_pretty(entries).map_err(|e| CredentialError::StorageFailed {
                reason: e.to_string(),
            })?;

        // Staged in the target directory so the rename stays on one
        // filesystem. The staging file is created owner-only (0600).
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let failed = |e: std::io::Error| CredentialError::StorageFailed {
            reason: format!("{}: {e}", self.path.display()),
        };
        let mut staging = NamedTempFile::new_in(dir).map_err(failed)?;
        staging.write_all(text.as_bytes()).map_err(failed)?;
        staging
            .persist(&self.path)
            .map(|_| ())
            .map_err(|e| failed(e.error))
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: CredentialKey) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    fn write(&self, changes: Vec<CredentialWrite>) -> Result<(), CredentialError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = entries.clone();
        apply(&mut next, changes);
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }
}
