//! Persistence for the single bearer credential.
//!
//! Every component that reads or writes the token goes through a
//! `TokenStore`; nobody keeps a private copy.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Keychain service name
const SERVICE_NAME: &str = "elib";

/// Keychain account holding the bearer token
const TOKEN_ACCOUNT: &str = "access_token";

/// Token file name in the data directory
const TOKEN_FILE: &str = "token.json";

pub trait TokenStore: Send + Sync {
    fn save(&self, token: &str) -> Result<()>;

    /// Current token, if any. Read failures are treated as absent.
    fn get(&self) -> Option<String>;

    /// Remove the token. Removing from an empty store succeeds.
    fn remove(&self) -> Result<()>;

    fn has_token(&self) -> bool {
        self.get().is_some()
    }
}

// ============================================================================
// OS keychain
// ============================================================================

pub struct KeyringTokenStore {
    service: String,
}

impl KeyringTokenStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(&self.service, TOKEN_ACCOUNT).context("Failed to create keyring entry")
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringTokenStore {
    fn save(&self, token: &str) -> Result<()> {
        self.entry()?
            .set_password(token)
            .context("Failed to store token in keychain")
    }

    fn get(&self) -> Option<String> {
        let entry = match self.entry() {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Keychain unavailable");
                return None;
            }
        };
        match entry.get_password() {
            Ok(token) => Some(token),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read token from keychain");
                None
            }
        }
    }

    fn remove(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

// ============================================================================
// JSON file
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
    saved_at: DateTime<Utc>,
}

pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn token_path(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE)
    }

    fn read(&self) -> Result<Option<StoredToken>> {
        let path = self.token_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read token file")?;
        let stored: StoredToken =
            serde_json::from_str(&contents).context("Failed to parse token file")?;
        Ok(Some(stored))
    }
}

impl TokenStore for FileTokenStore {
    fn save(&self, token: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir).context("Failed to create data directory")?;
        let stored = StoredToken {
            access_token: token.to_string(),
            saved_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&stored)?;
        std::fs::write(self.token_path(), contents).context("Failed to write token file")?;
        debug!("Token saved to file");
        Ok(())
    }

    fn get(&self) -> Option<String> {
        match self.read() {
            Ok(stored) => stored
                .map(|s| s.access_token)
                .filter(|token| !token.is_empty()),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable token file");
                None
            }
        }
    }

    fn remove(&self) -> Result<()> {
        let path = self.token_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to delete token file")?;
            debug!("Token file removed");
        }
        Ok(())
    }
}

// ============================================================================
// In-memory
// ============================================================================

#[derive(Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn save(&self, token: &str) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("token slot poisoned"))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn get(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    fn remove(&self) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("token slot poisoned"))?;
        *slot = None;
        Ok(())
    }
}
