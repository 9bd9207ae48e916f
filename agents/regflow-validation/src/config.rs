//! Agent configuration
//!
//! Loaded from an optional TOML file, then overridden by `REGFLOW_*`
//! environment variables:
//!
//! | Variable                        | Field                    |
//! |---------------------------------|--------------------------|
//! | `REGFLOW_HOST`                  | `server.host`            |
//! | `REGFLOW_PORT`                  | `server.port`            |
//! | `REGFLOW_LOG_LEVEL`             | `logging.level`          |
//! | `REGFLOW_LOG_JSON`              | `logging.json`           |
//! | `REGFLOW_LEDGER_PATH`           | `ledger.path`            |
//! | `REGFLOW_LEDGER_VERIFY_ON_OPEN` | `ledger.verify_on_open`  |

use regflow_audit::LedgerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, ValidationError};

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// `host:port` bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON log lines
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete agent configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub server: ServerConfig,
    pub ledger: LedgerConfig,
    pub logging: LoggingConfig,
}

impl AgentConfig {
    /// Load configuration from an optional TOML file plus the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ValidationError::unreadable(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse TOML configuration text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `REGFLOW_*` overrides from a variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("REGFLOW_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("REGFLOW_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ValidationError::config(format!("invalid REGFLOW_PORT '{}'", port)))?;
        }
        if let Some(level) = get("REGFLOW_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = get("REGFLOW_LOG_JSON") {
            self.logging.json = parse_bool("REGFLOW_LOG_JSON", &json)?;
        }
        if let Some(path) = get("REGFLOW_LEDGER_PATH") {
            self.ledger.path = Some(PathBuf::from(path));
        }
        if let Some(verify) = get("REGFLOW_LEDGER_VERIFY_ON_OPEN") {
            self.ledger.verify_on_open = parse_bool("REGFLOW_LEDGER_VERIFY_ON_OPEN", &verify)?;
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ValidationError::config(format!(
            "invalid boolean for {}: '{}'",
            key, other
        ))),
    }
}
