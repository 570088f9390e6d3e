//! Configuration management.
//!
//! Configuration is loaded from multiple sources with the following priority:
//!
//! 1. Environment variables (ARCBOX_*, nested keys separated by `__`)
//! 2. User configuration file (~/.config/arcbox/config.toml)
//! 3. System configuration file (/etc/arcbox/config.toml)
//! 4. Default values
//!
//! ## Example Configuration File
//!
//! ```toml
//! data_dir = "~/.arcbox"
//!
//! [naming]
//! generated_prefix = "container"
//!
//! [logging]
//! level = "info"
//! ```

use arcbox_container::manager::DEFAULT_NAME_PREFIX;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data directory.
    pub data_dir: PathBuf,
    /// Naming configuration.
    pub naming: NamingConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            naming: NamingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from files and environment.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment(Figment::new().merge(Toml::file(system_config_path())))
            .merge(Toml::file(user_config_path()))
            .merge(Env::prefixed("ARCBOX_").split("__"))
            .extract()
    }

    /// Loads configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, figment::Error> {
        Self::figment(Figment::new())
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("ARCBOX_").split("__"))
            .extract()
    }

    fn figment(sources: Figment) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(sources)
    }

    /// Returns the directory holding the naming state.
    #[must_use]
    pub fn containers_dir(&self) -> PathBuf {
        self.data_dir.join("containers")
    }
}

/// Container naming configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Prefix of names generated for anonymous containers.
    pub generated_prefix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            generated_prefix: DEFAULT_NAME_PREFIX.to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/var/lib"))
        .join(".arcbox")
}

fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("arcbox")
        .join("config.toml")
}

fn system_config_path() -> PathBuf {
    PathBuf::from("/etc/arcbox/config.toml")
}
