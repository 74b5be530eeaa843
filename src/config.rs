//! Configuration for userbook, read from `userbook.toml`.
//!
//! Layered file → environment → CLI. A missing file yields the defaults.
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! db_path = ".userbook/users.db"
//! dev_mode = false
//!
//! [client]
//! base_url = "http://127.0.0.1:8080"
//! page_size = 10
//! request_timeout_secs = 30
//! ```
//!
//! Environment overrides: `USERBOOK_HOST`, `USERBOOK_PORT`, `USERBOOK_DB_PATH`,
//! `USERBOOK_BASE_URL`, `USERBOOK_PAGE_SIZE`, `USERBOOK_REQUEST_TIMEOUT_SECS`.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

pub const DEFAULT_CONFIG_FILE: &str = "userbook.toml";

/// Collection service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Permissive CORS for a front end served from another origin
    #[serde(default)]
    pub dev_mode: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".userbook/users.db")
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
            dev_mode: false,
        }
    }
}

/// Form controller settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Records requested per load-more
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_page_size() -> u32 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_size: default_page_size(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ClientSection {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserbookConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub client: ClientSection,
}

impl UserbookConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from `path`, or return defaults if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `USERBOOK_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("USERBOOK_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("USERBOOK_PORT") {
            self.server.port = parse_var("USERBOOK_PORT", port)?;
        }
        if let Some(db_path) = lookup("USERBOOK_DB_PATH") {
            self.server.db_path = PathBuf::from(db_path);
        }
        if let Some(base_url) = lookup("USERBOOK_BASE_URL") {
            self.client.base_url = base_url;
        }
        if let Some(page_size) = lookup("USERBOOK_PAGE_SIZE") {
            self.client.page_size = parse_var("USERBOOK_PAGE_SIZE", page_size)?;
        }
        if let Some(timeout) = lookup("USERBOOK_REQUEST_TIMEOUT_SECS") {
            self.client.request_timeout_secs = parse_var("USERBOOK_REQUEST_TIMEOUT_SECS", timeout)?;
        }
        Ok(())
    }

    /// Validate the configuration and return a list of problems.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.server.port == 0 {
            problems.push("server.port must be non-zero".to_string());
        }
        if self.server.host.trim().is_empty() {
            problems.push("server.host must not be empty".to_string());
        }
        if self.client.page_size == 0 {
            problems.push("client.page_size must be at least 1".to_string());
        }
        if self.client.request_timeout_secs == 0 {
            problems.push("client.request_timeout_secs must be at least 1".to_string());
        }
        if !self.client.base_url.starts_with("http://")
            && !self.client.base_url.starts_with("https://")
        {
            problems.push(format!(
                "client.base_url '{}' must start with http:// or https://",
                self.client.base_url
            ));
        }

        problems
    }
}

fn parse_var<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}
