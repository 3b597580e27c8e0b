//! Configuration management for aql-exec.
//!
//! Connection profiles live in a TOML file as loosely-typed [`ProfileConfig`]
//! tables. Every operation re-reads them through a [`ProfileProvider`] and
//! validates them into an immutable [`ConnectionProfile`], so edits to the file
//! take effect on the next run.

use crate::error::{AqlExecError, Result};
use crate::query::QuerySplitter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Separator used between queries when a profile does not set one.
pub const DEFAULT_BATCH_SEPARATOR: &str = "//!";

/// Batch size used when a profile does not set one.
pub const DEFAULT_BATCH_SIZE: u32 = 1000;

/// Connection timeout used when a profile does not set one.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 500;

/// Main configuration structure, as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Name of the selected connection profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_connection: Option<String>,

    /// Named connection profiles, kept sorted by name.
    #[serde(default)]
    pub connections: BTreeMap<String, ProfileConfig>,
}

/// A connection profile as written by the user. Nothing is validated yet.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ProfileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Destination pattern for file-sink mode, e.g. `results/*.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_file_name: Option<String>,

    /// Regex separating queries in a buffer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_batch_separator: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_save: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_count: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_ms: Option<u64>,
}

impl ProfileConfig {
    /// Applies environment variables (ARANGO_HOST, ARANGO_PORT, etc.) as
    /// defaults for fields the file leaves unset.
    pub fn apply_env_defaults(&mut self) {
        self.apply_defaults_from(|key| std::env::var(key).ok());
    }

    /// Same as [`apply_env_defaults`](Self::apply_env_defaults), reading
    /// variables through `lookup`.
    pub fn apply_defaults_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.host.is_none() {
            self.host = lookup("ARANGO_HOST");
        }
        if self.port.is_none() {
            self.port = lookup("ARANGO_PORT").and_then(|p| p.parse().ok());
        }
        if self.database.is_none() {
            self.database = lookup("ARANGO_DATABASE");
        }
        if self.username.is_none() {
            self.username = lookup("ARANGO_USER");
        }
        if self.password.is_none() {
            self.password = lookup("ARANGO_PASSWORD");
        }
    }
}

/// A validated connection profile. Immutable for the duration of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionProfile {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: String,
    pub result_file_name: Option<String>,
    pub query_batch_separator: String,
    pub auto_save: bool,
    pub result_count: bool,
    pub batch_size: u32,
    pub connect_timeout: Duration,
}

impl ConnectionProfile {
    /// Validates a raw profile table.
    ///
    /// `host`, `port` and `database` are required. The separator must compile
    /// as a regex and the batch size must be positive.
    pub fn from_config(name: &str, raw: &ProfileConfig) -> Result<Self> {
        let missing =
            |field: &str| AqlExecError::config(format!("missing field '{field}' in connections.{name}"));

        let host = raw
            .host
            .clone()
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| missing("host"))?;
        let port = raw.port.ok_or_else(|| missing("port"))?;
        let database = raw
            .database
            .clone()
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| missing("database"))?;

        let batch_size = raw.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
        if batch_size == 0 {
            return Err(AqlExecError::config(format!(
                "batch_size must be positive in connections.{name}"
            )));
        }

        let query_batch_separator = raw
            .query_batch_separator
            .clone()
            .unwrap_or_else(|| DEFAULT_BATCH_SEPARATOR.to_string());
        QuerySplitter::new(&query_batch_separator).map_err(|e| {
            AqlExecError::config(format!("connections.{name}.query_batch_separator: {e}"))
        })?;

        Ok(Self {
            name: name.to_string(),
            host,
            port,
            username: raw.username.clone().filter(|u| !u.is_empty()),
            password: raw.password.clone(),
            database,
            result_file_name: raw.result_file_name.clone().filter(|p| !p.is_empty()),
            query_batch_separator,
            auto_save: raw.auto_save.unwrap_or(false),
            result_count: raw.result_count.unwrap_or(true),
            batch_size,
            connect_timeout: Duration::from_millis(
                raw.connect_timeout_ms.unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS),
            ),
        })
    }

    /// Builds the splitter for this profile's separator.
    pub fn splitter(&self) -> Result<QuerySplitter> {
        QuerySplitter::new(&self.query_batch_separator).map_err(|e| {
            AqlExecError::config(format!(
                "connections.{}.query_batch_separator: {e}",
                self.name
            ))
        })
    }

    /// Returns a display-safe string (no password) for UI purposes.
    pub fn display_string(&self) -> String {
        format!("{} @ {}:{}", self.database, self.host, self.port)
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("aql-exec")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file is an empty config.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AqlExecError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Writes the configuration back to `path`, creating parent directories.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| AqlExecError::config(format!("Failed to serialize config: {e}")))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)
            .map_err(|e| AqlExecError::config(format!("Failed to write config file: {e}")))
    }

    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            AqlExecError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Profile names in ascending order.
    pub fn profile_names(&self) -> Vec<String> {
        self.connections.keys().cloned().collect()
    }

    /// Validates the named profile, filling unset fields from the environment.
    pub fn profile(&self, name: &str) -> Result<ConnectionProfile> {
        let mut raw = self
            .connections
            .get(name)
            .cloned()
            .ok_or_else(|| AqlExecError::config(format!("Connection '{name}' not found")))?;
        raw.apply_env_defaults();
        ConnectionProfile::from_config(name, &raw)
    }

    /// The selected profile name, falling back to the first one by name.
    pub fn selected_name(&self) -> Result<String> {
        if let Some(name) = &self.default_connection {
            if self.connections.contains_key(name) {
                return Ok(name.clone());
            }
        }
        self.connections
            .keys()
            .next()
            .cloned()
            .ok_or_else(|| AqlExecError::config("No connections configured"))
    }

    /// Marks `name` as selected. Fails for unknown profiles.
    pub fn select(&mut self, name: &str) -> Result<()> {
        if !self.connections.contains_key(name) {
            return Err(AqlExecError::config(format!(
                "Connection '{name}' not found"
            )));
        }
        self.default_connection = Some(name.to_string());
        Ok(())
    }
}

/// Source of connection profiles and of the persisted profile selection.
pub trait ProfileProvider: Send + Sync {
    /// All profile names, sorted.
    fn list_profile_names(&self) -> Result<Vec<String>>;

    /// Loads and validates one profile.
    fn get_profile(&self, name: &str) -> Result<ConnectionProfile>;

    /// Name of the currently selected profile.
    fn default_profile_name(&self) -> Result<String>;

    /// Persists a new selection.
    fn set_default_profile_name(&self, name: &str) -> Result<()>;
}

/// Profiles read from a TOML file on every call.
#[derive(Debug, Clone)]
pub struct FileProfileProvider {
    path: PathBuf,
}

impl FileProfileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Config> {
        Config::load_from_file(&self.path)
    }
}

impl ProfileProvider for FileProfileProvider {
    fn list_profile_names(&self) -> Result<Vec<String>> {
        Ok(self.load()?.profile_names())
    }

    fn get_profile(&self, name: &str) -> Result<ConnectionProfile> {
        self.load()?.profile(name)
    }

    fn default_profile_name(&self) -> Result<String> {
        self.load()?.selected_name()
    }

    fn set_default_profile_name(&self, name: &str) -> Result<()> {
        let mut config = self.load()?;
        config.select(name)?;
        config.save_to_file(&self.path)
    }
}

/// Profiles held in memory, for embedding and tests.
#[derive(Debug, Default)]
pub struct StaticProfileProvider {
    config: Mutex<Config>,
}

impl StaticProfileProvider {
    pub fn new(config: Config) -> Self {
        Self {
            config: Mutex::new(config),
        }
    }

    /// A provider with a single profile, selected.
    pub fn single(name: &str, profile: ProfileConfig) -> Self {
        let mut connections = BTreeMap::new();
        connections.insert(name.to_string(), profile);
        Self::new(Config {
            default_connection: Some(name.to_string()),
            connections,
        })
    }

    fn with_config<T>(&self, f: impl FnOnce(&mut Config) -> Result<T>) -> Result<T> {
        let mut guard = self
            .config
            .lock()
            .map_err(|_| AqlExecError::internal("profile store lock poisoned"))?;
        f(&mut guard)
    }
}

impl ProfileProvider for StaticProfileProvider {
    fn list_profile_names(&self) -> Result<Vec<String>> {
        self.with_config(|c| Ok(c.profile_names()))
    }

    fn get_profile(&self, name: &str) -> Result<ConnectionProfile> {
        self.with_config(|c| {
            let raw = c
                .connections
                .get(name)
                .ok_or_else(|| AqlExecError::config(format!("Connection '{name}' not found")))?;
            ConnectionProfile::from_config(name, raw)
        })
    }

    fn default_profile_name(&self) -> Result<String> {
        self.with_config(|c| c.selected_name())
    }

    fn set_default_profile_name(&self, name: &str) -> Result<()> {
        self.with_config(|c| c.select(name))
    }
}
