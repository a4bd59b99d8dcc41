//! Application configuration management.
//!
//! Settings live at `~/.config/elib/config.json`. A few of them can be
//! overridden from the environment (or a `.env` file loaded by the binary):
//!
//! - `ELIB_API_URL`: backend base URL
//! - `ELIB_TOKEN_STORAGE`: `file`, `keyring` or `memory`

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::DEFAULT_BASE_URL;
use crate::auth::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore};

/// Application name used for config/data/cache directory paths
const APP_NAME: &str = "elib";

const CONFIG_FILE: &str = "config.json";

pub const API_URL_ENV: &str = "ELIB_API_URL";
pub const TOKEN_STORAGE_ENV: &str = "ELIB_TOKEN_STORAGE";

/// Books shown per page when the config does not say otherwise
pub const DEFAULT_PAGE_SIZE: usize = 4;

/// Where the access token is kept between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorageKind {
    #[default]
    File,
    Keyring,
    Memory,
}

impl FromStr for TokenStorageKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "keyring" => Ok(Self::Keyring),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow::anyhow!("Unknown token storage '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub token_storage: TokenStorageKind,
    pub last_email: Option<String>,
    pub page_size: Option<usize>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Where persistent client state (the token file) lives
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir =
            dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        let cache_dir =
            dirs::cache_dir().ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join("logs"))
    }

    /// Base URL: environment, then config file, then the built-in default.
    pub fn api_base_url(&self) -> String {
        self.base_url_with(std::env::var(API_URL_ENV).ok())
    }

    fn base_url_with(&self, env_override: Option<String>) -> String {
        env_override
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn page_size(&self) -> usize {
        self.page_size.filter(|&n| n > 0).unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Storage kind after applying `ELIB_TOKEN_STORAGE`. An unparseable value
    /// is logged and ignored.
    pub fn token_storage(&self) -> TokenStorageKind {
        self.storage_with(std::env::var(TOKEN_STORAGE_ENV).ok())
    }

    fn storage_with(&self, env_override: Option<String>) -> TokenStorageKind {
        match env_override.map(|s| s.parse::<TokenStorageKind>()) {
            Some(Ok(kind)) => kind,
            Some(Err(e)) => {
                warn!(error = %e, "Ignoring {}", TOKEN_STORAGE_ENV);
                self.token_storage
            }
            None => self.token_storage,
        }
    }

    /// Build the token store this configuration asks for.
    pub fn token_store(&self) -> Result<Arc<dyn TokenStore>> {
        let kind = self.token_storage();
        debug!(?kind, "Opening token store");
        let store: Arc<dyn TokenStore> = match kind {
            TokenStorageKind::File => Arc::new(FileTokenStore::new(self.data_dir()?)),
            TokenStorageKind::Keyring => Arc::new(KeyringTokenStore::new()),
            TokenStorageKind::Memory => Arc::new(MemoryTokenStore::new()),
        };
        Ok(store)
    }
}
