use crate::constants::{
    DEFAULT_DATABASE_PATH, DEFAULT_HOST, DEFAULT_LOG_DIR, DEFAULT_PORT,
};
use crate::error::{RecordsError, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATABASE_PATH),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    /// Also write JSON lines to a daily rolling file under `directory`
    pub json_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_LOG_DIR),
            json_file: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load configuration: defaults, then the TOML file if it exists, then
    /// `RECORDS_*` environment overrides.
    pub fn load(config_path: &Path) -> Result<Self> {
        let mut config = Self::from_file(config_path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse the TOML file at `config_path`; a missing file yields defaults.
    pub fn from_file(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            RecordsError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&config_content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply environment-style overrides through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("RECORDS_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("RECORDS_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| RecordsError::Config(format!("RECORDS_PORT is not a port: {port}")))?;
        }
        if let Some(path) = lookup("RECORDS_DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("RECORDS_LOG_DIR") {
            self.logging.directory = PathBuf::from(dir);
        }
        if let Some(flag) = lookup("RECORDS_METRICS") {
            self.metrics.enabled = parse_flag(&flag)
                .ok_or_else(|| RecordsError::Config(format!("RECORDS_METRICS is not a boolean: {flag}")))?;
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|_| RecordsError::Config(format!("Invalid bind address: {addr}")))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
