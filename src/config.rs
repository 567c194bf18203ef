use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, warn};
use serde::Deserialize;

pub const APP_DIR: &str = "babua";
const CONFIG_FILE: &str = "config.toml";
const DEFAULT_DB_NAME: &str = "babua.db";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: Option<PathBuf>,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn app_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

pub fn default_config_path() -> PathBuf {
    app_dir().join(CONFIG_FILE)
}

impl Config {
    /// `$BABUA_CONFIG` or the default location, then environment overrides.
    pub fn load() -> Self {
        let path = std::env::var_os("BABUA_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(default_config_path);
        let mut config = Self::load_from(&path);
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// A missing file yields defaults; an unreadable or invalid file is
    /// logged and yields defaults.
    pub fn load_from(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                return Self::default();
            }
            Err(e) => {
                warn!("Failed to read config {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match toml::from_str(&text) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Failed to parse config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db) = lookup("BABUA_DB").filter(|v| !v.is_empty()) {
            self.database = Some(PathBuf::from(db));
        }
        if let Some(url) = lookup("BABUA_CATALOG_URL").filter(|v| !v.is_empty()) {
            self.catalog.url = Some(url);
        }
    }

    pub fn database_path(&self) -> PathBuf {
        match &self.database {
            Some(path) => path.clone(),
            None => {
                let dir = app_dir();
                std::fs::create_dir_all(&dir).ok();
                dir.join(DEFAULT_DB_NAME)
            }
        }
    }

    pub fn catalog_url(&self) -> Option<&str> {
        self.catalog.url.as_deref().filter(|u| !u.trim().is_empty())
    }
}
