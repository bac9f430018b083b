//! Toast Notification Store
//!
//! An observable, bounded queue of transient user-facing notifications with
//! deferred auto-dismissal and explicit dismiss/update semantics.
//!
//! # Architecture
//!
//! - **Actions / reducer**: every change is an [`Action`] applied by the pure [`reduce`] function
//! - **TimerRegistry**: at most one pending auto-dismiss or removal timer per notification
//! - **NotificationStore**: the ordered list, the dispatch queue and the subscriber list
//! - **Subscribers**: display surfaces receiving the full list after every change
//!
//! # Example Usage
//!
//! ```no_run
//! use toaster::notifications::{NotificationStore, NotifySpec, StoreConfig, Variant};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = NotificationStore::new(StoreConfig::default())?;
//!
//! let _subscription = store.subscribe(|notifications: &[toaster::notifications::Notification]| {
//!     println!("{} notifications visible", notifications.len());
//! });
//!
//! let handle = store.notify(NotifySpec::new().title("Saved").variant(Variant::Success));
//! handle.dismiss();
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod config;
pub mod error;
pub mod handle;
pub mod model;
pub mod store;
pub mod subscriber;
pub mod timers;

#[cfg(test)]
mod tests;

pub use actions::{reduce, Action, Effect, Transition};
pub use config::StoreConfig;
pub use error::{NotificationError, NotificationResult};
pub use handle::NotificationHandle;
pub use model::{Notification, NotificationId, NotificationPatch, NotifySpec, Variant};
pub use store::{NotificationStore, StoreStats};
pub use subscriber::{Subscriber, SubscriberId, Subscription};
pub use timers::TimerRegistry;
