//! Notification Store Configuration

use std::time::Duration;

use super::error::{NotificationError, NotificationResult};

/// Maximum number of notifications kept at once
pub const DEFAULT_CAPACITY: usize = 3;

/// Auto-dismiss delay used when a notification does not set its own
pub const DEFAULT_AUTO_DISMISS: Duration = Duration::from_millis(5000);

/// Grace period between dismissal and removal
pub const DEFAULT_REMOVE_DELAY: Duration = Duration::from_millis(500);

/// Store-wide constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    pub capacity: usize,
    pub auto_dismiss: Duration,
    pub remove_delay: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            auto_dismiss: DEFAULT_AUTO_DISMISS,
            remove_delay: DEFAULT_REMOVE_DELAY,
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_auto_dismiss(mut self, auto_dismiss: Duration) -> Self {
        self.auto_dismiss = auto_dismiss;
        self
    }

    #[must_use]
    pub fn with_remove_delay(mut self, remove_delay: Duration) -> Self {
        self.remove_delay = remove_delay;
        self
    }

    /// Validate store configuration parameters
    pub fn validate(&self) -> NotificationResult<()> {
        if self.capacity == 0 {
            return Err(NotificationError::invalid_config("capacity must be at least 1"));
        }

        if self.auto_dismiss.is_zero() {
            return Err(NotificationError::invalid_config(
                "auto-dismiss delay must be greater than 0",
            ));
        }

        if self.remove_delay.is_zero() {
            return Err(NotificationError::invalid_config(
                "remove delay must be greater than 0",
            ));
        }

        if self.remove_delay >= self.auto_dismiss {
            return Err(NotificationError::invalid_config(format!(
                "remove delay ({}ms) must be shorter than the auto-dismiss delay ({}ms)",
                self.remove_delay.as_millis(),
                self.auto_dismiss.as_millis()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = StoreConfig::default();
        assert_eq!(config.capacity, 3);
        assert_eq!(config.remove_delay, Duration::from_millis(500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert!(StoreConfig::default().with_capacity(0).validate().is_err());
        assert!(StoreConfig::default()
            .with_auto_dismiss(Duration::ZERO)
            .validate()
            .is_err());
        assert!(StoreConfig::default()
            .with_remove_delay(Duration::ZERO)
            .validate()
            .is_err());

        let err = StoreConfig::default()
            .with_auto_dismiss(Duration::from_millis(400))
            .validate()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid notification store configuration: remove delay (500ms) must be shorter than the auto-dismiss delay (400ms)"
        );

        assert!(StoreConfig::default().with_capacity(1).validate().is_ok());
    }
}
