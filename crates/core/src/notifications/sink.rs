//! Notification sink trait and implementations.

use std::sync::{Arc, Mutex};

use super::model::Notification;

/// Trait for receiving user-facing notifications.
///
/// The host surface implements this to render a toast/banner widget.
/// `notify()` must be fast and non-blocking; a sink that drops a
/// notification must not affect explorer state.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// No-op implementation for tests or headless contexts.
#[derive(Clone, Default)]
pub struct NoOpNotificationSink;

impl NotificationSink for NoOpNotificationSink {
    fn notify(&self, _notification: Notification) {
        // Intentionally empty - notifications are discarded
    }
}

/// Mock sink for testing - collects emitted notifications.
#[derive(Clone, Default)]
pub struct MockNotificationSink {
    notifications: Arc<Mutex<Vec<Notification>>>,
}

impl MockNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected notifications.
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.notifications.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.lock().unwrap().is_empty()
    }
}

impl NotificationSink for MockNotificationSink {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }
}
