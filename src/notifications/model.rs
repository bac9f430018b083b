//! Notification Data Model
//!
//! The `Notification` entity carried by the store, its identifier and
//! severity variant, plus the caller-facing `NotifySpec` and
//! `NotificationPatch` value types.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

/// Callback invoked by display surfaces to request an `open` change
pub type OpenChangeCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Opaque, unique identifier of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(Uuid);

impl NotificationId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Severity variant; only affects downstream presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Default,
    Destructive,
    Success,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Default => "default",
            Variant::Destructive => "destructive",
            Variant::Success => "success",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(Variant::Default),
            "destructive" => Ok(Variant::Destructive),
            "success" => Ok(Variant::Success),
            _ => Err(format!(
                "Invalid variant: {}. Valid options: default, destructive, success",
                s
            )),
        }
    }
}

/// A transient user-facing notification.
///
/// Instances are only created by [`NotificationStore::notify`]; the values a
/// subscriber sees are snapshots, so mutating them has no effect on the store.
///
/// [`NotificationStore::notify`]: crate::notifications::NotificationStore::notify
#[derive(Clone, Serialize)]
pub struct Notification {
    id: NotificationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    variant: Variant,
    open: bool,
    #[serde(
        rename = "duration_ms",
        serialize_with = "serialize_millis",
        skip_serializing_if = "Option::is_none"
    )]
    duration: Option<Duration>,
    #[serde(skip)]
    on_open_change: Option<OpenChangeCallback>,
}

impl Notification {
    pub(crate) fn new(id: NotificationId, spec: NotifySpec) -> Self {
        Self {
            id,
            title: spec.title,
            description: spec.description,
            variant: spec.variant,
            open: true,
            duration: spec.duration,
            on_open_change: None,
        }
    }

    pub(crate) fn with_open_change(mut self, callback: OpenChangeCallback) -> Self {
        self.on_open_change = Some(callback);
        self
    }

    pub fn id(&self) -> NotificationId {
        self.id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// `true` while visible; becomes `false` once dismissed and stays that way
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Caller-supplied auto-dismiss delay, if any
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Ask the store to change this notification's `open` state.
    ///
    /// Display surfaces call this from their close affordance. Requests to
    /// reopen are forwarded to the callback but the store never acts on them.
    pub fn request_open_change(&self, open: bool) {
        if let Some(callback) = &self.on_open_change {
            callback(open);
        }
    }

    pub(crate) fn close(&mut self) {
        self.open = false;
    }

    pub(crate) fn apply_patch(&mut self, patch: &NotificationPatch) {
        if let Some(title) = &patch.title {
            self.title = Some(title.clone());
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        if let Some(variant) = patch.variant {
            self.variant = variant;
        }
        if let Some(duration) = patch.duration {
            self.duration = Some(duration);
        }
    }
}

impl fmt::Debug for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notification")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("description", &self.description)
            .field("variant", &self.variant)
            .field("open", &self.open)
            .field("duration", &self.duration)
            .field("on_open_change", &self.on_open_change.is_some())
            .finish()
    }
}

fn serialize_millis<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match duration {
        Some(d) => serializer.serialize_some(&u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
        None => serializer.serialize_none(),
    }
}

/// What a producer asks to show
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifySpec {
    pub title: Option<String>,
    pub description: Option<String>,
    pub variant: Variant,
    pub duration: Option<Duration>,
}

impl NotifySpec {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    /// Override the store's default auto-dismiss delay
    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Partial update merged into an existing notification.
///
/// Has no `open` field; a dismissed notification cannot be reopened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub variant: Option<Variant>,
    pub duration: Option<Duration>,
}

impl NotificationPatch {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn variant(mut self, variant: Variant) -> Self {
        self.variant = Some(variant);
        self
    }

    /// Record a new duration; timers already running are not rescheduled
    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.variant.is_none()
            && self.duration.is_none()
    }
}
