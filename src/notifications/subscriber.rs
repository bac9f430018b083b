//! Store Subscribers
//!
//! Display surfaces observe the store through the [`Subscriber`] trait. Any
//! `Fn(&[Notification]) + Send + Sync` closure is a subscriber; async
//! surfaces can use the watch channel bridge instead.

use std::fmt;
use std::sync::Weak;

use tokio::sync::watch;

use super::model::Notification;
use super::store::StoreInner;

/// Receives the full notification list after every applied change
pub trait Subscriber: Send + Sync {
    /// Handle the current list, most recent first
    fn on_change(&self, notifications: &[Notification]);

    /// A closed subscriber is dropped from the store at the next broadcast
    fn is_closed(&self) -> bool {
        false
    }
}

impl<F> Subscriber for F
where
    F: Fn(&[Notification]) + Send + Sync,
{
    fn on_change(&self, notifications: &[Notification]) {
        self(notifications)
    }
}

/// Identifies a subscription within one store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub(crate) u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscriber-{}", self.0)
    }
}

/// Handle returned by `subscribe`; detaches the subscriber on request.
///
/// Dropping the handle does not unsubscribe.
#[must_use = "keep the subscription to be able to unsubscribe later"]
pub struct Subscription {
    id: SubscriberId,
    store: Weak<StoreInner>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriberId, store: Weak<StoreInner>) -> Self {
        Self { id, store }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Detach from the store; returns `false` if it was already detached
    pub fn unsubscribe(&self) -> bool {
        match self.store.upgrade() {
            Some(store) => store.unsubscribe(self.id),
            None => false,
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Forwards every broadcast into a watch channel
pub(crate) struct WatchSubscriber {
    sender: watch::Sender<Vec<Notification>>,
}

impl WatchSubscriber {
    pub(crate) fn new(sender: watch::Sender<Vec<Notification>>) -> Self {
        Self { sender }
    }
}

impl Subscriber for WatchSubscriber {
    fn on_change(&self, notifications: &[Notification]) {
        self.sender.send_replace(notifications.to_vec());
    }

    fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
