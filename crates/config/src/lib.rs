//! # Libris Config
//!
//! Layered configuration, lowest precedence first:
//!
//! 1. Compiled-in defaults.
//! 2. `config.toml`, `config.yaml` or `config.json` in the platform
//!    configuration directory (e.g. `~/.config/libris/` on Linux).
//! 3. An explicitly given file (format picked by extension).
//! 4. `LIBRIS_` environment variables, with `__` separating nested keys:
//!    `LIBRIS_WATCH__DEBOUNCE_MS=250`.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "LIBRIS_";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory whose subdirectories are libraries.
    pub source: PathBuf,
    /// Where the virtual filesystem should be mounted.
    pub mount: PathBuf,
    pub catalog: CatalogConfig,
    pub watch: WatchConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Name of the catalog file inside each library directory.
    pub file_name: String,
    /// How long to wait on a catalog locked by its writer, in milliseconds.
    pub busy_timeout_ms: u64,
}
impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            file_name: "metadata.db".to_string(),
            busy_timeout_ms: 1500,
        }
    }
}
impl CatalogConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub enabled: bool,
    /// Quiet period after the last catalog write before reindexing, in
    /// milliseconds.
    pub debounce_ms: u64,
}
impl Default for WatchConfig {
    fn default() -> Self {
        Self { enabled: true, debounce_ms: 500 }
    }
}
impl WatchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Config {
    /// Loads and validates configuration from every layer, optionally
    /// including an explicit file.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(dirs) = ProjectDirs::from("", "", "libris") {
            let dir = dirs.config_dir();
            tracing::debug!(dir = %dir.display(), "Looking for configuration files");
            figment = figment
                .merge(Toml::file(dir.join("config.toml")))
                .merge(Yaml::file(dir.join("config.yaml")))
                .merge(Json::file(dir.join("config.json")));
        }
        if let Some(file) = file {
            if !file.is_file() {
                exn::bail!(ErrorKind::FileNotFound(file.to_path_buf()));
            }
            figment = match file.extension().and_then(|e| e.to_str()) {
                Some("yaml" | "yml") => figment.merge(Yaml::file(file)),
                Some("json") => figment.merge(Json::file(file)),
                _ => figment.merge(Toml::file(file)),
            };
        }
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extracts and validates configuration from an already assembled
    /// figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.source.as_os_str().is_empty() || !self.source.is_absolute() {
            exn::bail!(ErrorKind::Invalid("source"));
        }
        if self.mount.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid("mount"));
        }
        let file_name = &self.catalog.file_name;
        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            exn::bail!(ErrorKind::Invalid("catalog.file_name"));
        }
        if self.watch.debounce_ms == 0 {
            exn::bail!(ErrorKind::Invalid("watch.debounce_ms"));
        }
        Ok(())
    }
}
