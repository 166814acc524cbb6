//! Binds the notification scheduler to the authenticated-user lifecycle.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use pantry_core::UserId;

use crate::scheduler::NotificationScheduler;

/// Session/auth collaborator.
pub trait CurrentUser: Send + Sync {
    fn current_user(&self) -> Option<UserId>;
}

impl CurrentUser for watch::Receiver<Option<UserId>> {
    fn current_user(&self) -> Option<UserId> {
        *self.borrow()
    }
}

/// What [`SessionBinder::apply`] did with the scheduler.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionTransition {
    Unchanged,
    Armed(UserId),
    Switched { from: UserId, to: UserId },
    TornDown(UserId),
}

/// Arms the scheduler on login and tears it down on logout.
///
/// The scheduler's active user is the only record of the current session.
pub struct SessionBinder {
    scheduler: Arc<NotificationScheduler>,
}

impl SessionBinder {
    pub fn new(scheduler: Arc<NotificationScheduler>) -> Self {
        Self { scheduler }
    }

    pub fn scheduler(&self) -> &Arc<NotificationScheduler> {
        &self.scheduler
    }

    /// React to the authenticated user now being `user`.
    pub fn apply(&self, user: Option<UserId>) -> SessionTransition {
        let transition = match (self.scheduler.active_user(), user) {
            (prev, next) if prev == next => return SessionTransition::Unchanged,
            (None, Some(to)) => {
                self.scheduler.schedule_notification_check(to);
                SessionTransition::Armed(to)
            }
            (Some(from), Some(to)) => {
                self.scheduler.schedule_notification_check(to);
                SessionTransition::Switched { from, to }
            }
            (Some(from), None) => {
                self.scheduler.teardown();
                SessionTransition::TornDown(from)
            }
            (None, None) => SessionTransition::Unchanged,
        };

        info!(?transition, "session changed");
        transition
    }

    /// Re-read the session collaborator and apply what it reports.
    pub fn sync(&self, auth: &dyn CurrentUser) -> SessionTransition {
        self.apply(auth.current_user())
    }

    /// Follow `rx` until its sender goes away, then end the session.
    pub async fn run(&self, mut rx: watch::Receiver<Option<UserId>>) {
        let initial = *rx.borrow_and_update();
        self.apply(initial);

        while rx.changed().await.is_ok() {
            let next = *rx.borrow_and_update();
            self.apply(next);
        }

        self.apply(None);
    }
}
