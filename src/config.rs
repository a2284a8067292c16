//! Configuration file handling for akt.
//!
//! Loads configuration from `~/.config/akt/config.toml` or a custom path.
//! Everything is optional; the file only tunes defaults that the command
//! line can still override.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default disambiguation deadline, in milliseconds. One scheduler tick is
/// plenty for a terminal emulator to deliver the rest of a control sequence.
pub const DEFAULT_FLUSH_TIMEOUT_MS: u64 = 20;

/// Configuration file structure for akt.
/// Loaded from ~/.config/akt/config.toml (or custom path via --config).
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize)]
pub struct KeysConfig {
    /// How long to wait for the byte that disambiguates an ESC prefix.
    #[serde(default = "default_flush_timeout_ms")]
    pub flush_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Default)]
pub struct SessionConfig {
    /// Swallow the terminal's suspend character instead of forwarding it.
    #[serde(default)]
    pub no_suspend: bool,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            flush_timeout_ms: DEFAULT_FLUSH_TIMEOUT_MS,
        }
    }
}

fn default_flush_timeout_ms() -> u64 {
    DEFAULT_FLUSH_TIMEOUT_MS
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.clone(),
                source: e,
            })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        })
        .join("akt")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();
        assert_eq!(config.keys.flush_timeout_ms, DEFAULT_FLUSH_TIMEOUT_MS);
        assert!(!config.session.no_suspend);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/akt/config.toml")))
            .expect("missing file should not error");
        assert_eq!(config.keys.flush_timeout_ms, DEFAULT_FLUSH_TIMEOUT_MS);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str("[session]\nno_suspend = true\n").expect("parse");
        assert!(config.session.no_suspend);
        assert_eq!(config.keys.flush_timeout_ms, DEFAULT_FLUSH_TIMEOUT_MS);
    }

    #[test]
    fn test_full_file_parses() {
        let config: Config = toml::from_str(
            "[keys]\nflush_timeout_ms = 50\n\n[session]\nno_suspend = true\n",
        )
        .expect("parse");
        assert_eq!(config.keys.flush_timeout_ms, 50);
        assert!(config.session.no_suspend);
    }
}
