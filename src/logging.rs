// Logging module for toaster
// Installs a `log` backend writing text or JSON lines to stderr and,
// optionally, to a file with its own level.
//
// Text lines look like `2025-07-26 14:30:45 [INFO] toaster::notifications::store: message`;
// JSON lines carry the same fields as `timestamp`, `level`, `target` and `message`.
//
// Example usage:
// ```
// let config = LogConfig {
//     console_level: LevelFilter::Info,
//     file_level: Some(LevelFilter::Debug),
//     format: LogFormat::Json,
//     file: Some(PathBuf::from("toaster.log")),
// };
// init_logger(config)?;
// log::info!("Store ready");
// ```

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;
use serde::Serialize;

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}. Valid options: text, json", s)),
        }
    }
}

/// One JSON log line
#[derive(Debug, Serialize)]
struct JsonLogLine<'a> {
    timestamp: String,
    level: &'a str,
    target: &'a str,
    message: String,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub console_level: LevelFilter,
    pub file_level: Option<LevelFilter>,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_level: LevelFilter::Info,
            file_level: None,
            format: LogFormat::Text,
            file: None,
        }
    }
}

impl LogConfig {
    /// Most verbose level any destination accepts
    pub fn max_level(&self) -> LevelFilter {
        let file_level = match (&self.file, self.file_level) {
            (Some(_), Some(level)) => level,
            _ => LevelFilter::Off,
        };
        self.console_level.max(file_level)
    }
}

/// `log` backend for the toaster binary
pub struct ToasterLogger {
    config: LogConfig,
    file: Option<Mutex<File>>,
}

impl ToasterLogger {
    pub fn new(config: LogConfig) -> Result<Self> {
        let file = match &config.file {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("Failed to open log file: {}", path.display()))?;
                Some(Mutex::new(file))
            }
            None => None,
        };
        Ok(Self { config, file })
    }

    fn timestamp() -> String {
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }

    fn format_line(&self, level: Level, target: &str, message: &str) -> String {
        let level_name = level.as_str();
        match self.config.format {
            LogFormat::Text => {
                format!("{} [{}] {}: {}", Self::timestamp(), level_name, target, message)
            }
            LogFormat::Json => {
                let line = JsonLogLine {
                    timestamp: Self::timestamp(),
                    level: level_name,
                    target,
                    message: message.to_string(),
                };
                serde_json::to_string(&line).unwrap_or_else(|e| {
                    format!("{} [{}] {}: {} (json error: {})", Self::timestamp(), level_name, target, message, e)
                })
            }
        }
    }

    fn file_accepts(&self, level: Level) -> bool {
        self.file.is_some() && self.config.file_level.is_some_and(|max| level <= max)
    }
}

impl Log for ToasterLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.config.console_level || self.file_accepts(metadata.level())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = self.format_line(record.level(), record.target(), &record.args().to_string());

        if record.level() <= self.config.console_level {
            let _ = writeln!(io::stderr(), "{}", line);
        }

        if self.file_accepts(record.level()) {
            if let Some(file) = &self.file {
                if let Err(e) = writeln!(file.lock(), "{}", line) {
                    let _ = writeln!(io::stderr(), "File logging error: {}", e);
                }
            }
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
        if let Some(file) = &self.file {
            let _ = file.lock().flush();
        }
    }
}

/// Initialize the logging system with the given configuration
pub fn init_logger(config: LogConfig) -> Result<()> {
    let max_level = config.max_level();
    let logger = ToasterLogger::new(config)?;

    log::set_boxed_logger(Box::new(logger)).context("Failed to set global logger")?;
    log::set_max_level(max_level);

    Ok(())
}

/// Convert string to LevelFilter
pub fn parse_log_level(level_str: &str) -> Result<LevelFilter> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(LevelFilter::Error),
        "warn" => Ok(LevelFilter::Warn),
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        "trace" => Ok(LevelFilter::Trace),
        "off" => Ok(LevelFilter::Off),
        _ => Err(anyhow::anyhow!(
            "Invalid log level: {}. Valid levels: error, warn, info, debug, trace, off",
            level_str
        )),
    }
}
