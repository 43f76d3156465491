use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::clipboard::BackendKind;
use crate::logging::parse_level;
use crate::models::{ClipboardDataType, FormatAttempt, ProbeStrategy};
use crate::monitor::MonitorConfig;

/// Invalid configuration values
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("format #{index} has an empty id")]
    EmptyFormatId { index: usize },

    #[error("format {id:?} has kind {kind}, expected text, files, image or other")]
    InvalidFormatKind { id: String, kind: ClipboardDataType },

    #[error("unknown log level {value:?} for {field}")]
    InvalidLevel { field: &'static str, value: String },

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Ordered format list, empty means the backend's defaults
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub formats: Vec<FormatAttempt>,
}

/// General monitor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub backend: BackendKind,

    /// Pause between cycles on polling backends
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound for a single format read
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    #[serde(default)]
    pub probe: ProbeStrategy,

    #[serde(default = "default_true")]
    pub report_initial_content: bool,

    #[serde(default = "default_true")]
    pub fallback_to_other: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            backend: BackendKind::default(),
            poll_interval_ms: default_poll_interval_ms(),
            read_timeout_ms: default_read_timeout_ms(),
            probe: ProbeStrategy::default(),
            report_initial_content: true,
            fallback_to_other: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log file; stderr only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default = "default_stderr_level")]
    pub stderr_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            file: None,
            level: default_level(),
            stderr_level: default_stderr_level(),
        }
    }
}

// Default value functions for serde
fn default_poll_interval_ms() -> u64 {
    100
}

fn default_read_timeout_ms() -> u64 {
    100
}

fn default_true() -> bool {
    true
}

fn default_level() -> String {
    "info".to_string()
}

fn default_stderr_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Parse and validate a TOML document
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.general.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "poll_interval_ms",
            });
        }
        if self.general.read_timeout_ms == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "read_timeout_ms",
            });
        }

        for (field, value) in [
            ("level", &self.logging.level),
            ("stderr_level", &self.logging.stderr_level),
        ] {
            if parse_level(value).is_none() {
                return Err(ConfigError::InvalidLevel {
                    field,
                    value: value.clone(),
                });
            }
        }

        for (index, format) in self.formats.iter().enumerate() {
            if format.id.trim().is_empty() {
                return Err(ConfigError::EmptyFormatId { index });
            }
            if matches!(
                format.kind,
                ClipboardDataType::None | ClipboardDataType::Cleared
            ) {
                return Err(ConfigError::InvalidFormatKind {
                    id: format.id.clone(),
                    kind: format.kind,
                });
            }
        }

        Ok(())
    }

    /// Monitor settings described by this config
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            backend: self.general.backend,
            poll_interval: Duration::from_millis(self.general.poll_interval_ms),
            read_timeout: Duration::from_millis(self.general.read_timeout_ms),
            strategy: self.general.probe,
            formats: (!self.formats.is_empty()).then(|| self.formats.clone()),
            report_initial_content: self.general.report_initial_content,
            fallback_to_other: self.general.fallback_to_other,
        }
    }
}

/// Trait for configuration storage
pub trait ConfigStorage: Send + Sync {
    /// Load configuration, creating the default file when missing
    fn load(&self) -> Result<Config>;

    /// Save configuration to file
    fn save(&self, config: &Config) -> Result<()>;

    /// Get the config file path
    fn path(&self) -> &Path;

    /// Create default configuration file if it doesn't exist
    fn create_default(&self) -> Result<()>;
}

/// TOML-based implementation of ConfigStorage
pub struct TomlConfigStorage {
    path: PathBuf,
}

impl TomlConfigStorage {
    pub fn new(path: PathBuf) -> Self {
        TomlConfigStorage { path }
    }

    /// Load the file if it exists, without creating anything
    pub fn load_existing(&self) -> Result<Option<Config>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config from {:?}", self.path))?;

        let config = Config::from_toml(&contents)
            .with_context(|| format!("Invalid config file {:?}", self.path))?;

        log::info!("Loaded configuration from {:?}", self.path);
        log::debug!(
            "Config: backend={}, poll={}ms, timeout={}ms, {} custom formats",
            config.general.backend,
            config.general.poll_interval_ms,
            config.general.read_timeout_ms,
            config.formats.len()
        );

        Ok(Some(config))
    }
}

impl ConfigStorage for TomlConfigStorage {
    fn load(&self) -> Result<Config> {
        match self.load_existing()? {
            Some(config) => Ok(config),
            None => {
                log::info!(
                    "Config file not found at {:?}, creating default configuration",
                    self.path
                );
                self.create_default()?;
                Ok(Config::default())
            }
        }
    }

    fn save(&self, config: &Config) -> Result<()> {
        config.validate().context("Refusing to save invalid configuration")?;

        let toml_str =
            toml::to_string_pretty(config).context("Failed to serialize configuration")?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        fs::write(&self.path, toml_str)
            .with_context(|| format!("Failed to write config to {:?}", self.path))?;

        log::debug!("Saved configuration to {:?}", self.path);

        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn create_default(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        // The commented example doubles as the default file
        let example_config = include_str!("../../clipmon.toml.example");

        fs::write(&self.path, example_config)
            .with_context(|| format!("Failed to create default config at {:?}", self.path))?;

        log::info!("Created default configuration at {:?}", self.path);

        Ok(())
    }
}
