//! CLI module containing argument parsing and related functionality

pub mod args;

pub use args::{message_spec, parse_args, validate_args, Args};
