//! Application configuration management.
//!
//! This module handles loading the application configuration: which backend
//! holds the token slot, where the data directory lives, the login and home
//! paths, and an optional route table override.
//!
//! Configuration is stored at `~/.config/eventdesk/config.json`. A missing
//! file means defaults. `EVENTDESK_STORAGE` and `EVENTDESK_DATA_DIR` override
//! the file; `EVENTDESK_TOKEN` is read by the front end at startup.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::{FileStorage, KeyringStorage, MemoryStorage, SessionStore};
use crate::routing::{admin_routes, RouteRecord, RouteTable, DEFAULT_LOGIN_PATH};

/// Application name used for config/data directory paths
const APP_NAME: &str = "eventdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_HOME_PATH: &str = "/dashboard";

pub const ENV_STORAGE: &str = "EVENTDESK_STORAGE";
pub const ENV_DATA_DIR: &str = "EVENTDESK_DATA_DIR";
/// Token handed over by whatever signed the user in outside the console.
pub const ENV_TOKEN: &str = "EVENTDESK_TOKEN";

/// Where the token slot lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "keyring" | "keychain" => Ok(StorageBackend::Keyring),
            "memory" => Ok(StorageBackend::Memory),
            other => bail!("Unknown storage backend {:?} (expected file, keyring or memory)", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageBackend,
    pub data_dir: Option<PathBuf>,
    pub login_path: String,
    /// Where the login view sends the user after signing in.
    pub home_path: String,
    pub routes: Option<Vec<RouteRecord>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageBackend::default(),
            data_dir: None,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            home_path: DEFAULT_HOME_PATH.to_string(),
            routes: None,
        }
    }
}

impl Config {
    /// Load from the user config directory, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `EVENTDESK_*` overrides read through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(storage) = lookup(ENV_STORAGE).filter(|v| !v.is_empty()) {
            self.storage = storage
                .parse()
                .with_context(|| format!("Invalid {}", ENV_STORAGE))?;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [("login_path", &self.login_path), ("home_path", &self.home_path)] {
            if !value.starts_with('/') {
                bail!("{} must be an absolute path, got {:?}", name, value);
            }
        }
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// The configured route table, or the built-in admin routes.
    pub fn route_table(&self) -> Result<RouteTable> {
        let records = self.routes.clone().unwrap_or_else(admin_routes);
        RouteTable::new(records).context("Invalid route table")
    }

    /// Open the session over the configured token slot.
    pub fn open_session(&self) -> Result<SessionStore> {
        let session = match self.storage {
            StorageBackend::File => SessionStore::open(FileStorage::new(self.data_dir()?)),
            StorageBackend::Keyring => SessionStore::open(KeyringStorage::new()),
            StorageBackend::Memory => SessionStore::open(MemoryStorage::new()),
        };
        debug!(?session, "Session opened");
        Ok(session)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.login_path, "/login");
        assert_eq!(config.home_path, "/dashboard");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "storage": "keyring" }"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.storage, StorageBackend::Keyring);
        assert_eq!(config.login_path, "/login");
        assert!(config.routes.is_none());
    }

    #[test]
    fn test_relative_login_path_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "login_path": "login" }"#).unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(|key| match key {
                ENV_STORAGE => Some("Memory".to_string()),
                ENV_DATA_DIR => Some("/tmp/eventdesk-test".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/eventdesk-test"));
    }

    #[test]
    fn test_bad_storage_override() {
        let mut config = Config::default();
        let result = config.apply_overrides(|key| (key == ENV_STORAGE).then(|| "floppy".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_custom_routes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "routes": [
                    { "path": "/sign-in", "view": "AdminLogin" },
                    { "path": "/reports", "view": "Reports", "meta": { "requiresAuth": true } },
                    { "path": "*", "redirect": "/sign-in" }
                ],
                "login_path": "/sign-in"
            }"#,
        )
        .unwrap();
        let config = Config::load_from(&path).unwrap();
        let table = config.route_table().unwrap();
        assert_eq!(table.len(), 3);
        assert!(table.resolve("/reports").unwrap().requires_auth());
    }

    #[test]
    fn test_invalid_routes_reported() {
        let config = Config {
            routes: Some(vec![RouteRecord::view("reports", "Reports")]),
            ..Config::default()
        };
        assert!(config.route_table().is_err());
    }

    #[test]
    fn test_file_backend_session_uses_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: Some(dir.path().to_path_buf()),
            ..Config::default()
        };
        {
            let mut session = config.open_session().unwrap();
            session.login("abc123").unwrap();
        }
        let session = config.open_session().unwrap();
        assert_eq!(session.token(), Some("abc123"));
        assert!(dir.path().join("token.json").exists());
    }
}
