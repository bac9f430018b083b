//! Application orchestration module

pub mod execution;
pub mod initialization;

pub use execution::{attach_printer, render_broadcast, run_notifications};
pub use initialization::{build_store_config, configure_logging, load_configuration};
