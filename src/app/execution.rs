//! Driver: raise notifications, print every broadcast, wait for the store to drain

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::{debug, info};
use parking_lot::Mutex;

use crate::cli;
use crate::notifications::{Notification, NotificationStore, StoreStats, Subscription};

/// Render one broadcast as a single output line
pub fn render_broadcast(notifications: &[Notification], json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string(notifications)?);
    }

    if notifications.is_empty() {
        return Ok("[0] (empty)".to_string());
    }

    let entries: Vec<String> = notifications
        .iter()
        .map(|notification| {
            let mut entry = format!(
                "{}:{}",
                notification.variant(),
                notification.title().unwrap_or("(untitled)")
            );
            if let Some(description) = notification.description() {
                entry.push_str(" - ");
                entry.push_str(description);
            }
            if !notification.is_open() {
                entry.push_str(" (closing)");
            }
            entry
        })
        .collect();

    Ok(format!("[{}] {}", notifications.len(), entries.join(" | ")))
}

/// Attach a subscriber that writes every broadcast to `out`
pub fn attach_printer<W>(store: &NotificationStore, out: Arc<Mutex<W>>, json: bool) -> Subscription
where
    W: Write + Send + 'static,
{
    store.subscribe(move |notifications: &[Notification]| {
        match render_broadcast(notifications, json) {
            Ok(line) => {
                let mut out = out.lock();
                let _ = writeln!(out, "{}", line);
                let _ = out.flush();
            }
            Err(e) => debug!("Failed to render broadcast: {}", e),
        }
    })
}

/// Raise every message, optionally dismiss all, then wait until the list is empty
pub async fn run_notifications(store: &NotificationStore, args: &cli::Args) -> Result<StoreStats> {
    let mut changes = store.watch();
    let interval = Duration::from_millis(args.interval_ms);

    for (index, message) in args.messages.iter().enumerate() {
        if index > 0 && !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
        let handle = store.notify(cli::message_spec(message, args.variant));
        info!("Raised notification {}: {}", handle.id(), message);
    }

    if let Some(ms) = args.dismiss_all_after_ms {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        info!("Dismissing all notifications");
        store.dismiss_all();
    }

    while !store.is_empty() {
        if changes.changed().await.is_err() {
            break;
        }
    }

    let stats = store.stats();
    debug!("Store drained: {:?}", stats);
    Ok(stats)
}
