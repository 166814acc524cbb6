use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::NotificationSink;

/// Capability state of the platform notification facility.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPermission {
    /// The platform has no notification facility.
    Unavailable,
    /// The user has not answered the permission prompt yet.
    #[default]
    Pending,
    Granted,
    Denied,
}

impl NotificationPermission {
    pub fn allows_delivery(self) -> bool {
        self == NotificationPermission::Granted
    }
}

/// Forwards to the inner sink only while permission is granted.
///
/// Every other state drops the notification silently; no state is an error.
#[derive(Debug)]
pub struct GatedSink<S> {
    inner: S,
    permission: RwLock<NotificationPermission>,
}

impl<S: NotificationSink> GatedSink<S> {
    pub fn new(inner: S, permission: NotificationPermission) -> Self {
        Self {
            inner,
            permission: RwLock::new(permission),
        }
    }

    pub fn permission(&self) -> NotificationPermission {
        *self.permission.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the outcome of a permission prompt (or a platform change).
    pub fn set_permission(&self, permission: NotificationPermission) {
        *self.permission.write().unwrap_or_else(PoisonError::into_inner) = permission;
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: NotificationSink> NotificationSink for GatedSink<S> {
    fn emit(&self, title: &str, body: &str) {
        let permission = self.permission();
        if permission.allows_delivery() {
            self.inner.emit(title, body);
        } else {
            debug!(?permission, title, "notification suppressed");
        }
    }
}
