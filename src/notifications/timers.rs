//! Deferred Action Timers
//!
//! Keeps at most one pending timer per key. Each timer is a Tokio task that
//! sleeps until its deadline or until its cancellation token fires, whichever
//! comes first. Scheduling a key that already has a timer cancels the old one
//! first, so a key never has two live timers.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Duration;

use log::{debug, trace};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::error::{NotificationError, NotificationResult};

struct PendingTimer {
    generation: u64,
    deadline: Instant,
    token: CancellationToken,
}

struct TimerTable<K> {
    pending: HashMap<K, PendingTimer>,
    next_generation: u64,
    fired: u64,
}

impl<K> Drop for TimerTable<K> {
    fn drop(&mut self) {
        for timer in self.pending.values() {
            timer.token.cancel();
        }
    }
}

/// Registry of deferred actions keyed by `K`
pub struct TimerRegistry<K> {
    table: Arc<Mutex<TimerTable<K>>>,
    runtime: Handle,
}

impl<K> TimerRegistry<K>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
{
    /// Create a registry bound to the current Tokio runtime
    pub fn new() -> NotificationResult<Self> {
        let runtime = Handle::try_current().map_err(|_| NotificationError::NoRuntime)?;
        Ok(Self::with_handle(runtime))
    }

    /// Create a registry that spawns its timers on `runtime`
    pub fn with_handle(runtime: Handle) -> Self {
        Self {
            table: Arc::new(Mutex::new(TimerTable {
                pending: HashMap::new(),
                next_generation: 0,
                fired: 0,
            })),
            runtime,
        }
    }

    /// Run `action` once after `delay`, replacing any timer already pending for `key`.
    ///
    /// Returns `true` when an earlier timer was replaced.
    pub fn schedule<F>(&self, key: K, delay: Duration, action: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let token = CancellationToken::new();
        let deadline = deadline_after(delay);

        let (generation, replaced) = {
            let mut table = self.table.lock();
            let generation = table.next_generation;
            table.next_generation += 1;

            let previous = table.pending.insert(
                key.clone(),
                PendingTimer {
                    generation,
                    deadline,
                    token: token.clone(),
                },
            );
            if let Some(previous) = &previous {
                previous.token.cancel();
            }
            (generation, previous.is_some())
        };

        trace!("Scheduled timer for {:?} in {:?} (replaced: {})", key, delay, replaced);

        let table = Arc::downgrade(&self.table);
        self.runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep_until(deadline) => {
                    if claim(&table, &key, generation) {
                        debug!("Timer fired for {:?}", key);
                        action();
                    }
                }
            }
        });

        replaced
    }

    /// Cancel the pending timer for `key`; safe if it already fired or never existed
    pub fn cancel(&self, key: &K) -> bool {
        match self.table.lock().pending.remove(key) {
            Some(timer) => {
                timer.token.cancel();
                trace!("Cancelled timer for {:?}", key);
                true
            }
            None => false,
        }
    }

    /// Cancel every pending timer, returning how many were cancelled
    pub fn cancel_all(&self) -> usize {
        let mut table = self.table.lock();
        let count = table.pending.len();
        for (_, timer) in table.pending.drain() {
            timer.token.cancel();
        }
        if count > 0 {
            trace!("Cancelled {} pending timers", count);
        }
        count
    }

    pub fn is_scheduled(&self, key: &K) -> bool {
        self.table.lock().pending.contains_key(key)
    }

    /// Deadline of the pending timer for `key`
    pub fn deadline(&self, key: &K) -> Option<Instant> {
        self.table.lock().pending.get(key).map(|timer| timer.deadline)
    }

    /// Number of pending timers
    pub fn len(&self) -> usize {
        self.table.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total timers that reached their deadline and ran
    pub fn fired_count(&self) -> u64 {
        self.table.lock().fired
    }
}

/// Longest wait a timer is armed for; longer delays saturate to it
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

fn deadline_after(delay: Duration) -> Instant {
    Instant::now() + delay.min(FAR_FUTURE)
}

/// Remove the entry for `key` if it still belongs to timer `generation`.
///
/// A timer that lost the race against a replacement or cancellation finds a
/// different generation (or nothing) and must not run.
fn claim<K>(table: &Weak<Mutex<TimerTable<K>>>, key: &K, generation: u64) -> bool
where
    K: Eq + Hash,
{
    let Some(table) = table.upgrade() else {
        return false;
    };
    let mut table = table.lock();
    match table.pending.get(key) {
        Some(timer) if timer.generation == generation => {
            table.pending.remove(key);
            table.fired += 1;
            true
        }
        _ => false,
    }
}
