//! Application initialization and configuration

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, LevelFilter};

use crate::notifications::StoreConfig;
use crate::{cli, config, logging};

pub fn load_configuration(args: &cli::Args) -> Result<config::ConfigManager> {
    if let Some(config_file) = &args.config_file {
        debug!("Loading configuration from explicit file: {}", config_file.display());
        config::ConfigManager::load_from_file(config_file.clone())
    } else {
        config::ConfigManager::load()
    }
}

/// Resolve logging settings. Precedence: CLI flags > config file > defaults.
pub fn configure_logging(args: &cli::Args, config: &config::ConfigManager) -> Result<logging::LogConfig> {
    let console_level = if args.debug {
        LevelFilter::Trace
    } else if args.verbose {
        LevelFilter::Debug
    } else if args.quiet {
        LevelFilter::Error
    } else {
        match config.log_level() {
            Ok(Some(level)) => {
                debug!("Using console log level from config: {:?}", level);
                level
            }
            Ok(None) => LevelFilter::Info,
            Err(e) => {
                debug!("Invalid logging level in config, using default: {}", e);
                LevelFilter::Info
            }
        }
    };

    let format = match &args.log_format {
        Some(format) => logging::LogFormat::from_str(format).map_err(|e| anyhow::anyhow!(e))?,
        None => config.log_format()?.unwrap_or_default(),
    };

    let file = args.log_file.clone().or_else(|| config.log_file());

    let file_level = match &args.log_file_level {
        Some(level_str) => Some(logging::parse_log_level(level_str)?),
        None => config.file_log_level()?,
    };

    // A log file without its own level follows the console
    let file_level = match (&file, file_level) {
        (Some(_), Some(level)) => Some(level),
        (Some(_), None) => Some(console_level),
        (None, _) => None,
    };

    debug!(
        "Logging: console {:?}, format {:?}, file {:?} at {:?}",
        console_level, format, file, file_level
    );

    Ok(logging::LogConfig {
        console_level,
        file_level,
        format,
        file,
    })
}

/// Store settings from the config file with CLI overrides applied on top
pub fn build_store_config(args: &cli::Args, config: &config::ConfigManager) -> Result<StoreConfig> {
    let mut store_config = config.store_config()?;

    if let Some(capacity) = args.capacity {
        store_config = store_config.with_capacity(capacity);
    }
    if let Some(ms) = args.auto_dismiss_ms {
        store_config = store_config.with_auto_dismiss(Duration::from_millis(ms));
    }
    if let Some(ms) = args.remove_delay_ms {
        store_config = store_config.with_remove_delay(Duration::from_millis(ms));
    }

    store_config
        .validate()
        .context("Invalid store settings on the command line")?;

    debug!("Store configuration: {:?}", store_config);
    Ok(store_config)
}
