use std::io;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{error, info};
use parking_lot::Mutex;

use toaster::notifications::NotificationStore;
use toaster::{app, cli, logging};

fn main() {
    if let Err(e) = run() {
        error!("Application error: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = cli::parse_args();

    cli::validate_args(&args)?;

    let config_manager = app::load_configuration(&args)?;

    let log_config = app::configure_logging(&args, &config_manager)?;
    logging::init_logger(log_config)?;

    let store_config = app::build_store_config(&args, &config_manager)?;

    // The store arms its timers on the runtime it is created in
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    let stats = runtime.block_on(async {
        let store = NotificationStore::new(store_config)?;
        let _printer = app::attach_printer(&store, Arc::new(Mutex::new(io::stdout())), args.json);
        app::run_notifications(&store, &args).await
    })?;

    info!(
        "Done: {} actions, {} broadcasts, {} timers fired, {} delivery failures",
        stats.actions_dispatched, stats.broadcasts, stats.timers_fired, stats.delivery_failures
    );

    Ok(())
}
