pub mod settings;

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

pub use settings::{
    Config, ConfigError, ConfigStorage, GeneralConfig, LoggingConfig, TomlConfigStorage,
};

/// Environment variable that points at a config file directly
pub const CONFIG_ENV: &str = "CLIPMON_CONFIG";

const CONFIG_FILE: &str = "clipmon.toml";

/// XDG config directory for clipmon, without creating it
///
/// $XDG_CONFIG_HOME/clipmon, falling back to ~/.config/clipmon
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        return Ok(PathBuf::from(xdg_config).join("clipmon"));
    }

    let home = env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config/clipmon"))
}

/// Config file path: $CLIPMON_CONFIG if set, else the XDG location
pub fn config_path() -> Result<PathBuf> {
    match env::var(CONFIG_ENV) {
        Ok(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => Ok(config_dir()?.join(CONFIG_FILE)),
    }
}

/// Load the config for an embedding host, never touching the filesystem
/// beyond reading. Missing or broken files give the defaults.
pub fn load_read_only() -> Config {
    let path = match config_path() {
        Ok(path) => path,
        Err(e) => {
            log::debug!("No config location ({:#}), using defaults", e);
            return Config::default();
        }
    };

    match TomlConfigStorage::new(path).load_existing() {
        Ok(Some(config)) => config,
        Ok(None) => Config::default(),
        Err(e) => {
            log::warn!("Ignoring config: {:#}", e);
            Config::default()
        }
    }
}
