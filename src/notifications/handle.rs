//! Producer Entry Point
//!
//! [`NotificationStore::notify`] is the only public way to create a
//! notification. It returns a [`NotificationHandle`] bound to the new id.

use std::fmt;
use std::sync::Arc;

use log::debug;

use super::actions::Action;
use super::model::{Notification, NotificationId, NotificationPatch, NotifySpec};
use super::store::NotificationStore;

impl NotificationStore {
    /// Show a new notification.
    ///
    /// The notification starts open, is prepended to the list (evicting the
    /// oldest entry when full) and gets its auto-dismiss timer armed. Its
    /// `on_open_change` callback dismisses it when asked to close.
    pub fn notify(&self, spec: NotifySpec) -> NotificationHandle {
        let id = NotificationId::new();

        let store = self.downgrade();
        let notification = Notification::new(id, spec).with_open_change(Arc::new(move |open| {
            if !open {
                if let Some(store) = store.upgrade() {
                    store.dismiss(id);
                }
            }
        }));

        debug!("Raising notification {}", id);
        self.dispatch(Action::Add(notification));

        NotificationHandle {
            id,
            store: self.clone(),
        }
    }
}

/// Caller-side handle to one notification
#[derive(Clone)]
pub struct NotificationHandle {
    id: NotificationId,
    store: NotificationStore,
}

impl NotificationHandle {
    pub fn id(&self) -> NotificationId {
        self.id
    }

    /// Close the notification; it is removed after the grace delay
    pub fn dismiss(&self) {
        self.store.dismiss(self.id);
    }

    /// Merge `patch` into the notification if it is still in the store
    pub fn update(&self, patch: NotificationPatch) {
        self.store.update(self.id, patch);
    }

    /// Current state of the notification, `None` once removed
    pub fn snapshot(&self) -> Option<Notification> {
        self.store.get(self.id)
    }

    /// Whether the notification is still in the store and open
    pub fn is_active(&self) -> bool {
        self.snapshot().is_some_and(|n| n.is_open())
    }
}

impl fmt::Debug for NotificationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationHandle").field("id", &self.id).finish()
    }
}
