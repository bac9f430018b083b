use anyhow::Result;
use clap::Parser;
use log::debug;
use std::path::PathBuf;

use crate::notifications::{NotifySpec, Variant};

/// Toast notification store driver
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "toaster")]
#[command(about = "Raise transient notifications through a bounded, auto-dismissing store and print every change")]
#[command(version)]
pub struct Args {
    /// Notifications to raise, in order; "title: description" splits into both fields
    #[arg(value_name = "MESSAGE")]
    pub messages: Vec<String>,

    /// Verbose output (debug level logging)
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output (error level logging only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug output (trace level logging)
    #[arg(long)]
    pub debug: bool,

    /// Log format: text or json
    #[arg(long, value_name = "FORMAT")]
    pub log_format: Option<String>,

    /// Log file path for file output
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level for file output (independent of console level)
    #[arg(long, value_name = "LEVEL")]
    pub log_file_level: Option<String>,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    // ============ STORE CONFIGURATION ============

    /// Maximum number of notifications kept at once
    #[arg(long, value_name = "N")]
    pub capacity: Option<usize>,

    /// Default auto-dismiss delay in milliseconds
    #[arg(long = "auto-dismiss-ms", value_name = "MS")]
    pub auto_dismiss_ms: Option<u64>,

    /// Delay between dismissal and removal in milliseconds
    #[arg(long = "remove-delay-ms", value_name = "MS")]
    pub remove_delay_ms: Option<u64>,

    // ============ DRIVER ============

    /// Variant applied to every message: default, destructive or success
    #[arg(long, value_name = "VARIANT", default_value = "default")]
    pub variant: Variant,

    /// Pause between raising consecutive messages, in milliseconds
    #[arg(long = "interval-ms", value_name = "MS", default_value_t = 250)]
    pub interval_ms: u64,

    /// Dismiss everything this many milliseconds after the last message
    #[arg(long = "dismiss-all-after-ms", value_name = "MS")]
    pub dismiss_all_after_ms: Option<u64>,

    /// Print each broadcast as a JSON line
    #[arg(long)]
    pub json: bool,
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    let args = Args::parse();
    debug!("Parsed CLI arguments: {:?}", args);
    args
}

/// Validate CLI argument combinations
pub fn validate_args(args: &Args) -> Result<()> {
    let log_flags_count = [args.verbose, args.quiet, args.debug]
        .iter()
        .filter(|&&flag| flag)
        .count();

    if log_flags_count > 1 {
        return Err(anyhow::anyhow!(
            "Conflicting log level flags: only one of --verbose, --quiet, or --debug may be specified"
        ));
    }

    if let Some(format) = &args.log_format {
        match format.to_lowercase().as_str() {
            "text" | "json" => {}
            _ => {
                return Err(anyhow::anyhow!(
                    "Invalid log format '{}'. Valid options: text, json",
                    format
                ))
            }
        }
    }

    if args.log_file_level.is_some() && args.log_file.is_none() {
        return Err(anyhow::anyhow!(
            "--log-file-level requires --log-file to be specified"
        ));
    }

    if args.messages.iter().any(|m| m.trim().is_empty()) {
        return Err(anyhow::anyhow!("Messages must not be empty"));
    }

    Ok(())
}

/// Turn one command line message into a notify request
pub fn message_spec(message: &str, variant: Variant) -> NotifySpec {
    let spec = NotifySpec::new().variant(variant);
    match message.split_once(':') {
        Some((title, description)) if !title.trim().is_empty() && !description.trim().is_empty() => {
            spec.title(title.trim()).description(description.trim())
        }
        _ => spec.title(message.trim()),
    }
}
