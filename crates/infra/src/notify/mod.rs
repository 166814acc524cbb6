//! Notification delivery.
//!
//! Delivery is fire-and-forget: a sink never reports success or failure back
//! to the scheduler.

pub mod gated;

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::info;

pub use gated::{GatedSink, NotificationPermission};

/// A delivered notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// OS/browser alert facility.
pub trait NotificationSink: Send + Sync + 'static {
    fn emit(&self, title: &str, body: &str);
}

/// In-memory sink for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryNotificationSink {
    inner: Mutex<Vec<Notification>>,
}

impl InMemoryNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for InMemoryNotificationSink {
    fn emit(&self, title: &str, body: &str) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Notification {
                title: title.to_string(),
                body: body.to_string(),
            });
    }
}

/// Sink that writes each notification to the log. Used by headless runs.
#[derive(Debug, Default, Copy, Clone)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn emit(&self, title: &str, body: &str) {
        info!(target: "pantry::notification", title, body, "notification");
    }
}
