//! Notification Store
//!
//! Single source of truth for the active notification list. All mutation
//! goes through one dispatch queue: actions are queued and applied one at a
//! time (reduce, run timer effects, broadcast), so every subscriber observes
//! transitions in order and never a half-applied one. An action dispatched
//! from inside a subscriber callback waits in the queue until the current
//! broadcast has reached every subscriber. Callers on other threads block
//! until the draining thread has applied their action, so a returned
//! `dismiss` is always visible.

use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};
use std::time::Duration;

use log::{debug, trace, warn};
use parking_lot::{Condvar, Mutex};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::Instant;

use super::actions::{reduce, Action, Effect};
use super::config::StoreConfig;
use super::error::{NotificationError, NotificationResult};
use super::model::{Notification, NotificationId, NotificationPatch};
use super::subscriber::{Subscriber, SubscriberId, Subscription, WatchSubscriber};
use super::timers::TimerRegistry;

/// Counters describing store activity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Actions taken off the dispatch queue and reduced
    pub actions_dispatched: u64,

    /// Actions that matched at least one notification
    pub transitions_applied: u64,

    /// Broadcasts sent to the subscriber list
    pub broadcasts: u64,

    /// Individual subscriber deliveries that completed
    pub deliveries: u64,

    /// Subscriber callbacks that panicked
    pub delivery_failures: u64,

    /// Auto-dismiss and removal timers that fired
    pub timers_fired: u64,
}

#[derive(Default)]
struct DispatchQueue {
    actions: VecDeque<Action>,
    drainer: Option<ThreadId>,
}

/// Releases the queue when a drain ends, including by unwinding
struct DrainGuard<'a>(&'a StoreInner);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.queue.lock().drainer = None;
        self.0.drained.notify_all();
    }
}

type SubscriberList = Vec<(SubscriberId, Arc<dyn Subscriber>)>;

pub(crate) struct StoreInner {
    config: StoreConfig,
    state: Mutex<Vec<Notification>>,
    subscribers: Mutex<SubscriberList>,
    next_subscriber: AtomicU64,
    queue: Mutex<DispatchQueue>,
    drained: Condvar,
    timers: TimerRegistry<NotificationId>,
    stats: Mutex<StoreStats>,
}

impl StoreInner {
    pub(crate) fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);

        let removed = subscribers.len() < before;
        if removed {
            debug!("Unsubscribed {} from notifications", id);
        }
        removed
    }
}

/// Non-owning reference to a store, held by timers and callbacks
#[derive(Clone)]
pub(crate) struct WeakStore(Weak<StoreInner>);

impl WeakStore {
    pub(crate) fn upgrade(&self) -> Option<NotificationStore> {
        self.0.upgrade().map(|inner| NotificationStore { inner })
    }
}

/// Observable, bounded store of notifications.
///
/// Cloning yields another handle to the same store. Build one per
/// application and pass it to producers and display surfaces.
#[derive(Clone)]
pub struct NotificationStore {
    inner: Arc<StoreInner>,
}

impl NotificationStore {
    /// Create a store whose timers run on the current Tokio runtime.
    ///
    /// Fails with [`NotificationError::NoRuntime`] when called outside a
    /// runtime context.
    pub fn new(config: StoreConfig) -> NotificationResult<Self> {
        let runtime = Handle::try_current().map_err(|_| NotificationError::NoRuntime)?;
        Self::with_handle(config, runtime)
    }

    /// Create a store whose timers run on `runtime`
    pub fn with_handle(config: StoreConfig, runtime: Handle) -> NotificationResult<Self> {
        config.validate()?;
        debug!(
            "Creating notification store (capacity: {}, auto-dismiss: {:?}, remove delay: {:?})",
            config.capacity, config.auto_dismiss, config.remove_delay
        );

        Ok(Self {
            inner: Arc::new(StoreInner {
                config,
                state: Mutex::new(Vec::with_capacity(config.capacity + 1)),
                subscribers: Mutex::new(Vec::new()),
                next_subscriber: AtomicU64::new(0),
                queue: Mutex::new(DispatchQueue::default()),
                drained: Condvar::new(),
                timers: TimerRegistry::with_handle(runtime),
                stats: Mutex::new(StoreStats::default()),
            }),
        })
    }

    pub(crate) fn downgrade(&self) -> WeakStore {
        WeakStore(Arc::downgrade(&self.inner))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Queue `action` and apply it before returning.
    ///
    /// A dispatch from inside a subscriber callback (the thread already
    /// draining) only queues; the action runs after the current broadcast.
    /// A dispatch from another thread waits while that thread drains.
    pub(crate) fn dispatch(&self, action: Action) {
        let current = thread::current().id();
        {
            let mut queue = self.inner.queue.lock();
            queue.actions.push_back(action);
            if queue.drainer == Some(current) {
                trace!("Dispatch in progress; queued action ({} waiting)", queue.actions.len());
                return;
            }
            while queue.drainer.is_some() {
                self.inner.drained.wait(&mut queue);
            }
            if queue.actions.is_empty() {
                return;
            }
            queue.drainer = Some(current);
        }

        let _guard = DrainGuard(&*self.inner);
        loop {
            let next = self.inner.queue.lock().actions.pop_front();
            match next {
                Some(action) => self.apply(action),
                None => return,
            }
        }
    }

    /// Merge `patch` into notification `id`; unknown ids are ignored
    pub fn update(&self, id: NotificationId, patch: NotificationPatch) {
        self.dispatch(Action::Update { id, patch });
    }

    /// Close notification `id` and schedule its removal
    pub fn dismiss(&self, id: NotificationId) {
        self.dispatch(Action::Dismiss(Some(id)));
    }

    /// Close every notification and schedule their removal
    pub fn dismiss_all(&self) {
        self.dispatch(Action::Dismiss(None));
    }

    /// Delete notification `id` immediately
    pub fn remove(&self, id: NotificationId) {
        self.dispatch(Action::Remove(Some(id)));
    }

    /// Delete every notification immediately
    pub fn clear(&self) {
        self.dispatch(Action::Remove(None));
    }

    /// Attach a subscriber that receives the full list after every change
    pub fn subscribe<S>(&self, subscriber: S) -> Subscription
    where
        S: Subscriber + 'static,
    {
        let id = SubscriberId(self.inner.next_subscriber.fetch_add(1, Ordering::Relaxed));
        self.inner.subscribers.lock().push((id, Arc::new(subscriber)));
        debug!("Subscribed {} to notifications", id);
        Subscription::new(id, Arc::downgrade(&self.inner))
    }

    /// Detach a subscriber by id; returns `false` if it was not attached
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.inner.unsubscribe(id)
    }

    /// Watch channel carrying the current list, for async display surfaces.
    ///
    /// The bridge is detached once every receiver has been dropped.
    pub fn watch(&self) -> watch::Receiver<Vec<Notification>> {
        let (sender, receiver) = watch::channel(self.notifications());
        let _subscription = self.subscribe(WatchSubscriber::new(sender));
        receiver
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    /// Snapshot of the current list, most recent first
    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.state.lock().clone()
    }

    pub fn get(&self, id: NotificationId) -> Option<Notification> {
        self.inner.state.lock().iter().find(|n| n.id() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of auto-dismiss and removal timers still pending
    pub fn pending_timers(&self) -> usize {
        self.inner.timers.len()
    }

    /// When the pending timer for `id` fires, if one is pending
    pub fn timer_deadline(&self, id: NotificationId) -> Option<Instant> {
        self.inner.timers.deadline(&id)
    }

    pub fn stats(&self) -> StoreStats {
        let mut stats = self.inner.stats.lock().clone();
        stats.timers_fired = self.inner.timers.fired_count();
        stats
    }

    fn apply(&self, action: Action) {
        let name = action.name();
        let target = action.target();

        let (transition, snapshot) = {
            let mut state = self.inner.state.lock();
            let transition = reduce(&mut state, action, self.inner.config.capacity);
            let snapshot = transition.matched.then(|| state.clone());
            (transition, snapshot)
        };

        {
            let mut stats = self.inner.stats.lock();
            stats.actions_dispatched += 1;
            if transition.matched {
                stats.transitions_applied += 1;
            }
        }

        let Some(snapshot) = snapshot else {
            debug!("Action '{}' for {:?} matched no notification", name, target);
            return;
        };

        debug!("Applied '{}' for {:?} ({} active)", name, target, snapshot.len());

        for effect in transition.effects {
            self.run_effect(effect);
        }

        self.broadcast(&snapshot);
    }

    fn run_effect(&self, effect: Effect) {
        trace!("Running effect {:?}", effect);
        match effect {
            Effect::ScheduleDismiss { id, delay } => {
                let delay = delay.unwrap_or(self.inner.config.auto_dismiss);
                self.schedule(id, delay, Action::Dismiss(Some(id)));
            }
            Effect::ScheduleRemove(id) => {
                self.schedule(id, self.inner.config.remove_delay, Action::Remove(Some(id)));
            }
            Effect::Cancel(id) => {
                self.inner.timers.cancel(&id);
            }
            Effect::CancelAll => {
                self.inner.timers.cancel_all();
            }
        }
    }

    fn schedule(&self, id: NotificationId, delay: Duration, action: Action) {
        let store = self.downgrade();
        self.inner.timers.schedule(id, delay, move || {
            if let Some(store) = store.upgrade() {
                store.dispatch(action);
            }
        });
    }

    fn broadcast(&self, notifications: &[Notification]) {
        let subscribers: SubscriberList = self.inner.subscribers.lock().clone();

        let closed: Vec<SubscriberId> = subscribers
            .iter()
            .filter(|(_, subscriber)| subscriber.is_closed())
            .map(|(id, _)| *id)
            .collect();
        for id in &closed {
            self.inner.unsubscribe(*id);
        }

        let mut delivered = 0;
        let mut failed = 0;
        for (id, subscriber) in subscribers.iter().filter(|(id, _)| !closed.contains(id)) {
            let result = panic::catch_unwind(AssertUnwindSafe(|| subscriber.on_change(notifications)));
            match result {
                Ok(()) => delivered += 1,
                Err(_) => {
                    failed += 1;
                    warn!("{} panicked while handling a broadcast; continuing", id);
                }
            }
        }

        let mut stats = self.inner.stats.lock();
        stats.broadcasts += 1;
        stats.deliveries += delivered;
        stats.delivery_failures += failed;

        trace!(
            "Broadcast {} notifications to {} subscribers ({} failed)",
            notifications.len(),
            delivered,
            failed
        );
    }
}

impl fmt::Debug for NotificationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationStore")
            .field("config", &self.inner.config)
            .field("active", &self.len())
            .field("subscribers", &self.subscriber_count())
            .field("pending_timers", &self.pending_timers())
            .finish()
    }
}
