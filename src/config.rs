//! Application configuration
//!
//! Defaults, then an optional JSON file in the user's config directory, then
//! environment variables. Each layer only overrides the fields it sets.

use reqwest::Url;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com/";

const APP_DIR: &str = "album-viewer";
const DATABASE_FILE: &str = "photo_database.db";
const CONFIG_FILE: &str = "config.json";

pub const ENV_BASE_URL: &str = "ALBUM_VIEWER_BASE_URL";
pub const ENV_DATABASE: &str = "ALBUM_VIEWER_DATABASE";
pub const ENV_LOG: &str = "ALBUM_VIEWER_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the remote catalog; `photos` and `albums` are resolved against it
    pub base_url: String,
    /// SQLite file holding the saved photos
    pub database_path: PathBuf,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            database_path: default_database_path(),
            connect_timeout_secs: 5,
            request_timeout_secs: 30,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Load from the standard config file (if present) and the environment
    pub fn load() -> Result<Self> {
        let mut config = match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let config = Self::from_json(&json)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;

        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Override fields from environment variables, looked up through `var`
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(base_url) = var(ENV_BASE_URL) {
            self.base_url = base_url;
        }
        if let Some(database) = var(ENV_DATABASE) {
            self.database_path = PathBuf::from(database);
        }
        if let Some(filter) = var(ENV_LOG) {
            self.log_filter = filter;
        }
    }

    /// The parsed base url, always ending in `/` so `join` keeps its path
    pub fn base_url(&self) -> Result<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }

        Url::parse(&raw).map_err(|e| Error::Config(format!("invalid base url {raw:?}: {e}")))
    }
}

/// Get the path where the database should be stored
/// - Linux: ~/.local/share/album-viewer/photo_database.db
/// - macOS: ~/Library/Application Support/album-viewer/photo_database.db
/// - Windows: %APPDATA%\album-viewer\photo_database.db
fn default_database_path() -> PathBuf {
    let mut path = dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    path.push(APP_DIR);
    path.push(DATABASE_FILE);
    path
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_json(r#"{"base_url": "http://localhost:8080/api"}"#).unwrap();

        assert_eq!(config.base_url, "http://localhost:8080/api");
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.database_path.ends_with("album-viewer/photo_database.db"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_BASE_URL, "http://example.test/v1"),
            (ENV_DATABASE, "/tmp/photos.db"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.base_url, "http://example.test/v1");
        assert_eq!(config.database_path, PathBuf::from("/tmp/photos.db"));
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = Config {
            base_url: "http://example.test/v1".into(),
            ..Config::default()
        };

        let url = config.base_url().unwrap();
        assert_eq!(url.join("photos").unwrap().as_str(), "http://example.test/v1/photos");
    }

    #[test]
    fn test_invalid_base_url() {
        let config = Config {
            base_url: "not a url".into(),
            ..Config::default()
        };

        assert!(matches!(config.base_url(), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"log_filter": "debug"}"#).unwrap();

        assert_eq!(Config::from_file(&path).unwrap().log_filter, "debug");
        assert!(Config::from_file(&dir.path().join("missing.json")).is_err());
    }
}
