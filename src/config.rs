use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info, LevelFilter};
use serde::Deserialize;

use crate::logging::{parse_log_level, LogFormat};
use crate::notifications::StoreConfig;

/// `[store]` section: overrides for the notification store constants
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct StoreSection {
    pub capacity: Option<usize>,
    pub auto_dismiss_ms: Option<u64>,
    pub remove_delay_ms: Option<u64>,
}

/// `[logging]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct LoggingSection {
    pub level: Option<String>,
    pub format: Option<String>,
    pub file: Option<PathBuf>,
    pub file_level: Option<String>,
}

/// Parsed configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Configuration {
    pub store: StoreSection,
    pub logging: LoggingSection,
}

/// Configuration manager
pub struct ConfigManager {
    config: Configuration,
    config_file_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create a new ConfigManager from a Configuration (primarily for testing)
    pub fn from_config(config: Configuration) -> Self {
        Self {
            config,
            config_file_path: None,
        }
    }

    /// Load configuration using discovery hierarchy
    pub fn load() -> Result<Self> {
        debug!("Starting configuration discovery");

        for path in discover_config_files() {
            debug!("Attempting to load config from: {}", path.display());
            if path.exists() {
                info!("Loading configuration from: {}", path.display());
                return Self::load_from_file(path);
            }
        }

        info!("No configuration file found, using defaults");
        Ok(Self::from_config(Configuration::default()))
    }

    /// Load configuration from explicit file path
    pub fn load_from_file(path: PathBuf) -> Result<Self> {
        debug!("Loading configuration from file: {}", path.display());

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = parse_toml_config(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(Self {
            config,
            config_file_path: Some(path),
        })
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Path of the file the configuration came from, if any
    pub fn config_file_path(&self) -> Option<&Path> {
        self.config_file_path.as_deref()
    }

    /// Store configuration: defaults overlaid with the `[store]` section, validated
    pub fn store_config(&self) -> Result<StoreConfig> {
        let section = &self.config.store;
        let mut config = StoreConfig::default();

        if let Some(capacity) = section.capacity {
            config.capacity = capacity;
        }
        if let Some(auto_dismiss_ms) = section.auto_dismiss_ms {
            config.auto_dismiss = Duration::from_millis(auto_dismiss_ms);
        }
        if let Some(remove_delay_ms) = section.remove_delay_ms {
            config.remove_delay = Duration::from_millis(remove_delay_ms);
        }

        config
            .validate()
            .with_context(|| "Store configuration validation failed")?;

        Ok(config)
    }

    /// Console log level from `[logging] level`
    pub fn log_level(&self) -> Result<Option<LevelFilter>> {
        self.config
            .logging
            .level
            .as_deref()
            .map(parse_log_level)
            .transpose()
    }

    /// File log level from `[logging] file-level`
    pub fn file_log_level(&self) -> Result<Option<LevelFilter>> {
        self.config
            .logging
            .file_level
            .as_deref()
            .map(parse_log_level)
            .transpose()
    }

    /// Log format from `[logging] format`
    pub fn log_format(&self) -> Result<Option<LogFormat>> {
        match self.config.logging.format.as_deref() {
            Some(format) => Ok(Some(format.parse::<LogFormat>().map_err(anyhow::Error::msg)?)),
            None => Ok(None),
        }
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.config.logging.file.clone()
    }
}

/// Discover configuration files in order of precedence
fn discover_config_files() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // 1. Environment variable $TOASTER_CONFIG
    if let Ok(env_path) = env::var("TOASTER_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    // 2. XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("toaster").join("config.toml"));
    }

    // 3. Home directory
    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".toaster.toml"));
    }

    // 4. Project local
    paths.push(PathBuf::from("./.toaster.toml"));

    debug!("Config discovery paths: {:?}", paths);
    paths
}

fn parse_toml_config(content: &str) -> Result<Configuration> {
    let config: Configuration = toml::from_str(content).context("Failed to parse TOML content")?;
    debug!("Parsed configuration: {:?}", config);
    Ok(config)
}
