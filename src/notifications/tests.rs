//! Tests for the Notification Store

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{sleep, Instant};

use crate::notifications::{
    Action, Notification, NotificationError, NotificationPatch, NotificationStore, NotifySpec,
    StoreConfig, Subscriber, Subscription, Variant,
};

type Frame = Vec<(String, bool)>;

/// Records every broadcast as (title, open) pairs
#[derive(Clone, Default)]
struct Recorder {
    frames: Arc<Mutex<Vec<Frame>>>,
}

impl Recorder {
    fn frames(&self) -> Vec<Frame> {
        self.frames.lock().clone()
    }

    fn last(&self) -> Option<Frame> {
        self.frames.lock().last().cloned()
    }

    fn count(&self) -> usize {
        self.frames.lock().len()
    }
}

impl Subscriber for Recorder {
    fn on_change(&self, notifications: &[Notification]) {
        let frame = notifications
            .iter()
            .map(|n| (n.title().unwrap_or_default().to_string(), n.is_open()))
            .collect();
        self.frames.lock().push(frame);
    }
}

fn store() -> NotificationStore {
    NotificationStore::new(StoreConfig::default()).unwrap()
}

fn titled(title: &str) -> NotifySpec {
    NotifySpec::new().title(title)
}

fn titles(store: &NotificationStore) -> Vec<String> {
    store
        .notifications()
        .iter()
        .map(|n| n.title().unwrap_or_default().to_string())
        .collect()
}

const GRACE: Duration = Duration::from_millis(500);
const AUTO: Duration = Duration::from_millis(5000);
const TICK: Duration = Duration::from_millis(1);

#[test]
fn test_store_requires_runtime() {
    let result = NotificationStore::new(StoreConfig::default());
    assert!(matches!(result, Err(NotificationError::NoRuntime)));
}

#[tokio::test]
async fn test_store_rejects_invalid_config() {
    let result = NotificationStore::new(StoreConfig::default().with_capacity(0));
    assert!(matches!(result, Err(NotificationError::InvalidConfig { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_capacity_keeps_most_recent_first() {
    let store = store();

    for title in ["A", "B", "C", "D"] {
        store.notify(titled(title));
    }

    assert_eq!(titles(&store), vec!["D", "C", "B"]);
    assert_eq!(store.len(), 3);
    // Evicted "A" lost its timer along with its entry
    assert_eq!(store.pending_timers(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_then_removed_after_grace_delay() {
    let store = store();
    let handle = store.notify(titled("X"));

    handle.dismiss();

    let snapshot = handle.snapshot().unwrap();
    assert!(!snapshot.is_open());
    assert!(!handle.is_active());

    sleep(GRACE - TICK).await;
    assert_eq!(store.len(), 1);

    sleep(TICK * 2).await;
    assert!(store.is_empty());
    assert!(handle.snapshot().is_none());
    assert_eq!(store.pending_timers(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_explicit_dismiss_replaces_auto_dismiss_timer() {
    let store = store();
    let handle = store.notify(titled("X"));
    let now = Instant::now();

    assert_eq!(store.timer_deadline(handle.id()), Some(now + AUTO));

    handle.dismiss();

    assert_eq!(store.pending_timers(), 1);
    assert_eq!(store.timer_deadline(handle.id()), Some(now + GRACE));
}

#[tokio::test(start_paused = true)]
async fn test_auto_dismiss_escalates_to_removal() {
    let store = store();
    let recorder = Recorder::default();
    let _subscription = store.subscribe(recorder.clone());

    store.notify(titled("auto"));

    sleep(AUTO + TICK).await;
    assert_eq!(recorder.last(), Some(vec![("auto".to_string(), false)]));

    sleep(GRACE).await;
    assert!(store.is_empty());
    assert_eq!(
        recorder.frames(),
        vec![
            vec![("auto".to_string(), true)],
            vec![("auto".to_string(), false)],
            vec![],
        ]
    );
    assert_eq!(store.stats().timers_fired, 2);
}

#[tokio::test(start_paused = true)]
async fn test_custom_duration_overrides_default() {
    let store = store();
    let quick = store.notify(titled("quick").duration(Duration::from_millis(1000)));
    let slow = store.notify(titled("slow"));

    sleep(Duration::from_millis(1001)).await;
    assert!(!quick.is_active());
    assert!(slow.is_active());
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_is_idempotent() {
    let store = store();
    let recorder = Recorder::default();
    let _subscription = store.subscribe(recorder.clone());
    let handle = store.notify(titled("twice"));

    handle.dismiss();
    handle.dismiss();

    assert!(!handle.snapshot().unwrap().is_open());
    assert_eq!(store.pending_timers(), 1);
    assert_eq!(recorder.count(), 3);

    sleep(GRACE + TICK).await;
    assert!(store.is_empty());
    assert_eq!(store.stats().timers_fired, 1);
}

#[tokio::test(start_paused = true)]
async fn test_update_unknown_id_does_not_broadcast() {
    let store = store();
    let recorder = Recorder::default();
    let _subscription = store.subscribe(recorder.clone());
    let handle = store.notify(titled("known"));
    handle.dismiss();
    sleep(GRACE + TICK).await;
    let before = recorder.count();

    handle.update(NotificationPatch::new().title("ghost"));
    store.dismiss(handle.id());
    store.remove(handle.id());

    assert_eq!(recorder.count(), before);
    assert!(store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_update_patches_without_rescheduling() {
    let store = store();
    let recorder = Recorder::default();
    let _subscription = store.subscribe(recorder.clone());
    let handle = store.notify(titled("Uploading").description("0%"));
    let deadline = store.timer_deadline(handle.id());

    sleep(Duration::from_millis(100)).await;
    handle.update(
        NotificationPatch::new()
            .description("100%")
            .variant(Variant::Success)
            .duration(Duration::from_secs(60)),
    );

    let snapshot = handle.snapshot().unwrap();
    assert_eq!(snapshot.title(), Some("Uploading"));
    assert_eq!(snapshot.description(), Some("100%"));
    assert_eq!(snapshot.variant(), Variant::Success);
    assert_eq!(store.timer_deadline(handle.id()), deadline);
    assert_eq!(recorder.count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_all_schedules_independent_removals() {
    let store = store();
    let handles: Vec<_> = ["A", "B", "C"].iter().map(|t| store.notify(titled(t))).collect();

    store.dismiss_all();

    assert!(store.notifications().iter().all(|n| !n.is_open()));
    assert_eq!(store.pending_timers(), 3);

    // Removing one early leaves the other removals in place
    store.remove(handles[1].id());
    assert_eq!(store.pending_timers(), 2);

    sleep(GRACE + TICK).await;
    assert!(store.is_empty());
    assert_eq!(store.pending_timers(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_clear_removes_everything_and_cancels_timers() {
    let store = store();
    store.notify(titled("A"));
    store.notify(titled("B"));

    store.clear();

    assert!(store.is_empty());
    assert_eq!(store.pending_timers(), 0);

    sleep(AUTO * 2).await;
    assert_eq!(store.stats().timers_fired, 0);
}

#[tokio::test(start_paused = true)]
async fn test_unsubscribe_self_during_broadcast() {
    let store = store();
    let calls = Arc::new(AtomicUsize::new(0));
    let own: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

    let first = {
        let calls = Arc::clone(&calls);
        let own = Arc::clone(&own);
        store.subscribe(move |_: &[Notification]| {
            calls.fetch_add(1, Ordering::SeqCst);
            if let Some(subscription) = own.lock().take() {
                subscription.unsubscribe();
            }
        })
    };
    *own.lock() = Some(first);

    let recorder = Recorder::default();
    let _second = store.subscribe(recorder.clone());

    store.notify(titled("first"));
    assert_eq!(recorder.last(), Some(vec![("first".to_string(), true)]));

    store.notify(titled("second"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.count(), 2);
    assert_eq!(store.subscriber_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unsubscribe_other_during_broadcast() {
    let store = store();
    let recorder = Recorder::default();
    let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

    let _first = {
        let victim = Arc::clone(&victim);
        store.subscribe(move |_: &[Notification]| {
            if let Some(subscription) = victim.lock().take() {
                assert!(subscription.unsubscribe());
            }
        })
    };
    *victim.lock() = Some(store.subscribe(recorder.clone()));

    store.notify(titled("delivered"));
    assert_eq!(recorder.frames(), vec![vec![("delivered".to_string(), true)]]);

    store.notify(titled("missed"));
    assert_eq!(recorder.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_from_subscriber_is_applied_in_order() {
    let store = store();
    let dismisser = store.clone();
    let _auto_close = store.subscribe(move |notifications: &[Notification]| {
        for notification in notifications.iter().filter(|n| n.is_open()) {
            dismisser.dismiss(notification.id());
        }
    });
    let recorder = Recorder::default();
    let _recording = store.subscribe(recorder.clone());

    store.notify(titled("flash"));

    assert_eq!(
        recorder.frames(),
        vec![
            vec![("flash".to_string(), true)],
            vec![("flash".to_string(), false)],
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_panicking_subscriber_is_isolated() {
    let store = store();
    let _bad = store.subscribe(|_: &[Notification]| panic!("display surface crashed"));
    let recorder = Recorder::default();
    let _good = store.subscribe(recorder.clone());

    store.notify(titled("survives"));
    store.notify(titled("again"));

    assert_eq!(recorder.count(), 2);
    let stats = store.stats();
    assert_eq!(stats.delivery_failures, 2);
    assert_eq!(stats.deliveries, 2);
}

#[tokio::test(start_paused = true)]
async fn test_open_change_callback_dismisses() {
    let store = store();
    let handle = store.notify(titled("closable"));

    let snapshot = handle.snapshot().unwrap();
    snapshot.request_open_change(true);
    assert!(handle.is_active());

    snapshot.request_open_change(false);
    assert!(!handle.is_active());

    sleep(GRACE + TICK).await;
    assert!(store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_watch_receives_updates() {
    let store = store();
    let mut receiver = store.watch();
    assert!(receiver.borrow().is_empty());

    store.notify(titled("watched"));
    receiver.changed().await.unwrap();
    assert_eq!(receiver.borrow_and_update()[0].title(), Some("watched"));

    drop(receiver);
    assert_eq!(store.subscriber_count(), 1);
    store.notify(titled("pruned"));
    assert_eq!(store.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_store_cancels_pending_timers() {
    let metrics = tokio::runtime::Handle::current().metrics();
    let store = store();
    store.notify(titled("a"));
    store.notify(titled("b")).dismiss();
    sleep(TICK).await;
    assert_eq!(store.pending_timers(), 2);
    assert_eq!(metrics.num_alive_tasks(), 2);

    drop(store);
    sleep(TICK).await;

    // Cancelled timer tasks finish long before any deadline
    assert_eq!(metrics.num_alive_tasks(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_duration_keeps_store_usable() {
    let store = store();
    let recorder = Recorder::default();
    let _recording = store.subscribe(recorder.clone());

    let forever = store.notify(titled("forever").duration(Duration::MAX));
    assert_eq!(store.pending_timers(), 1);

    store.notify(titled("after"));
    assert_eq!(titles(&store), vec!["after", "forever"]);

    store.dismiss_all();
    assert!(store.notifications().iter().all(|n| !n.is_open()));

    sleep(GRACE + TICK).await;
    assert!(store.is_empty());
    assert!(forever.snapshot().is_none());
    assert_eq!(recorder.last(), Some(vec![]));
}

#[tokio::test(start_paused = true)]
async fn test_dismissed_notification_cannot_be_reopened_by_re_adding() {
    let store = store();
    let handle = store.notify(titled("once"));
    let open_snapshot = handle.snapshot().unwrap();

    handle.dismiss();
    store.dispatch(Action::Add(open_snapshot));

    assert!(!handle.is_active());
    assert!(handle.snapshot().is_some());
    sleep(GRACE + TICK).await;
    assert!(handle.snapshot().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dismiss_from_other_thread_waits_for_drain() {
    let store = store();
    let (tx, rx) = std::sync::mpsc::channel();
    let signalled = Arc::new(AtomicUsize::new(0));

    let first = Arc::clone(&signalled);
    let _slow = store.subscribe(move |notifications: &[Notification]| {
        if first.fetch_add(1, Ordering::SeqCst) == 0 {
            let _ = tx.send(notifications[0].id());
            std::thread::sleep(std::time::Duration::from_millis(100));
        }
    });

    let producer = store.clone();
    let raising = std::thread::spawn(move || {
        producer.notify(titled("slow"));
    });

    let id = rx.recv().unwrap();
    store.dismiss(id);
    assert!(!store.get(id).unwrap().is_open());

    raising.join().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_store_stats() {
    let store = store();
    let _recording = store.subscribe(Recorder::default());

    let handle = store.notify(titled("counted"));
    store.update(crate::notifications::NotificationId::new(), NotificationPatch::new());
    handle.dismiss();

    let stats = store.stats();
    assert_eq!(stats.actions_dispatched, 3);
    assert_eq!(stats.transitions_applied, 2);
    assert_eq!(stats.broadcasts, 2);
    assert_eq!(stats.deliveries, 2);
    assert_eq!(stats.delivery_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn test_clones_share_state() {
    let store = store();
    let other = store.clone();

    let handle = store.notify(titled("shared"));
    assert_eq!(other.get(handle.id()).unwrap().title(), Some("shared"));

    other.remove(handle.id());
    assert!(store.is_empty());
}
