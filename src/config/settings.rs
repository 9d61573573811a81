//! Request logger configuration settings

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Default configuration file looked up by [`LoggerSettings::load_config`]
pub const CONFIG_FILE: &str = "request_log.yml";

/// Severity at which request records are emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl Severity {
    /// Label written into the `level` field of a record
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "trace",
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }

    pub fn to_log_level(self) -> log::Level {
        match self {
            Severity::Trace => log::Level::Trace,
            Severity::Debug => log::Level::Debug,
            Severity::Info => log::Level::Info,
            Severity::Warn => log::Level::Warn,
            Severity::Error => log::Level::Error,
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Severity::Trace => tracing::Level::TRACE,
            Severity::Debug => tracing::Level::DEBUG,
            Severity::Info => tracing::Level::INFO,
            Severity::Warn => tracing::Level::WARN,
            Severity::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Severity::Trace),
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            other => Err(crate::error::Error::Config(format!("Unknown log level: {}", other))),
        }
    }
}

/// Process-wide settings read by every request.
///
/// Built once at startup and shared behind an `Arc`; nothing mutates it
/// while requests are in flight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Severity the request records are written at
    #[serde(default)]
    pub level: Severity,

    /// Header and parameter keys whose values are replaced by `[FILTERED]`.
    /// Matching is case-sensitive.
    #[serde(default)]
    pub filtered_keys: HashSet<String>,

    /// Server name copied into every record
    #[serde(default)]
    pub server: Option<String>,

    /// Application name copied into every record
    #[serde(default)]
    pub app: Option<String>,

    /// Environment name copied into every record
    #[serde(default)]
    pub environment: Option<String>,
}

impl LoggerSettings {
    /// Builder-style helper used by embedding hosts and tests
    pub fn with_filtered_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filtered_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        Self::from_yaml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))
    }

    /// Parse configuration from YAML text
    pub fn from_yaml_str(contents: &str) -> crate::error::Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Load configuration from `request_log.yml` when present, then apply
    /// environment variable overrides
    pub fn load_config() -> Result<Self> {
        let mut settings = if Path::new(CONFIG_FILE).exists() {
            Self::from_yaml_file(CONFIG_FILE)?
        } else {
            Self::default()
        };

        settings.apply_env_overrides()?;
        Ok(settings)
    }

    /// Load configuration from environment variables only
    pub fn from_env_vars() -> Result<Self> {
        let mut settings = Self::default();
        settings.apply_env_overrides()?;
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(level) = std::env::var("REQUEST_LOG_LEVEL") {
            self.level = level
                .parse()
                .with_context(|| format!("Invalid REQUEST_LOG_LEVEL: {}", level))?;
        }

        if let Ok(keys) = std::env::var("REQUEST_LOG_FILTERED_KEYS") {
            self.filtered_keys = parse_key_list(&keys);
        }

        if let Ok(server) = std::env::var("REQUEST_LOG_SERVER") {
            self.server = Some(server);
        }

        if let Ok(app) = std::env::var("REQUEST_LOG_APP") {
            self.app = Some(app);
        }

        if let Ok(environment) = std::env::var("REQUEST_LOG_ENVIRONMENT") {
            self.environment = Some(environment);
        }

        Ok(())
    }
}

/// Split a comma-separated key list, dropping blanks
fn parse_key_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}
