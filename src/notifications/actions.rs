//! Store Actions and Reducer
//!
//! Every change to the notification list is expressed as an [`Action`] and
//! applied by [`reduce`], a pure function over the ordered list. The reducer
//! never touches timers itself; it describes the timer work it needs as
//! [`Effect`]s that the store carries out after the transition.

use std::time::Duration;

use super::model::{Notification, NotificationId, NotificationPatch};

/// A discrete state transition request
#[derive(Debug, Clone)]
pub enum Action {
    /// Prepend a freshly created notification
    Add(Notification),

    /// Merge a partial patch into an existing notification
    Update {
        id: NotificationId,
        patch: NotificationPatch,
    },

    /// Close one notification, or every notification when `None`
    Dismiss(Option<NotificationId>),

    /// Delete one notification, or clear the list when `None`
    Remove(Option<NotificationId>),
}

impl Action {
    /// Short action name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Action::Add(_) => "add",
            Action::Update { .. } => "update",
            Action::Dismiss(_) => "dismiss",
            Action::Remove(_) => "remove",
        }
    }

    /// The notification targeted by this action, if it names one
    pub fn target(&self) -> Option<NotificationId> {
        match self {
            Action::Add(notification) => Some(notification.id()),
            Action::Update { id, .. } => Some(*id),
            Action::Dismiss(id) | Action::Remove(id) => *id,
        }
    }
}

/// Timer work requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Arm the auto-dismiss timer; `None` means the store default
    ScheduleDismiss {
        id: NotificationId,
        delay: Option<Duration>,
    },

    /// Arm the short post-dismiss removal timer
    ScheduleRemove(NotificationId),

    /// Drop whatever timer is pending for this id
    Cancel(NotificationId),

    /// Drop every pending timer
    CancelAll,
}

/// Outcome of applying one action
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    /// Whether the action matched at least one notification
    pub matched: bool,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn matched(effects: Vec<Effect>) -> Self {
        Self {
            matched: true,
            effects,
        }
    }

    fn unmatched() -> Self {
        Self::default()
    }
}

/// Apply `action` to `state`, most recent notification first.
///
/// The list never grows beyond `capacity`; overflow drops the oldest
/// entries from the tail.
pub fn reduce(state: &mut Vec<Notification>, action: Action, capacity: usize) -> Transition {
    match action {
        Action::Add(mut notification) => {
            let id = notification.id();
            let delay = notification.duration();

            // Closing is one-way: a replacement for a dismissed entry stays
            // closed and keeps its pending removal.
            let was_closed = state.iter().any(|existing| existing.id() == id && !existing.is_open());
            if was_closed {
                notification.close();
            }

            state.retain(|existing| existing.id() != id);
            state.insert(0, notification);

            let mut effects = Vec::new();
            if state.len() > capacity {
                effects.extend(state.drain(capacity..).map(|evicted| Effect::Cancel(evicted.id())));
            }
            if !was_closed {
                effects.push(Effect::ScheduleDismiss { id, delay });
            }
            Transition::matched(effects)
        }

        Action::Update { id, patch } => match state.iter_mut().find(|n| n.id() == id) {
            Some(notification) => {
                notification.apply_patch(&patch);
                Transition::matched(Vec::new())
            }
            None => Transition::unmatched(),
        },

        Action::Dismiss(Some(id)) => match state.iter_mut().find(|n| n.id() == id) {
            Some(notification) => {
                notification.close();
                Transition::matched(vec![Effect::ScheduleRemove(id)])
            }
            None => Transition::unmatched(),
        },

        Action::Dismiss(None) => {
            if state.is_empty() {
                return Transition::unmatched();
            }
            let effects = state
                .iter_mut()
                .map(|notification| {
                    notification.close();
                    Effect::ScheduleRemove(notification.id())
                })
                .collect();
            Transition::matched(effects)
        }

        Action::Remove(Some(id)) => match state.iter().position(|n| n.id() == id) {
            Some(index) => {
                state.remove(index);
                Transition::matched(vec![Effect::Cancel(id)])
            }
            None => Transition::unmatched(),
        },

        Action::Remove(None) => {
            if state.is_empty() {
                return Transition::unmatched();
            }
            state.clear();
            Transition::matched(vec![Effect::CancelAll])
        }
    }
}
