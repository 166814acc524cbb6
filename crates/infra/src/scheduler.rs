//! Per-user expiry notification scheduler.
//!
//! One scheduler drives at most one session at a time:
//! - Schedule: a pass runs immediately, then every `interval` (missed ticks are skipped)
//! - Serialization: timer passes and `check_now` share one pass guard held across fetch
//!   and evaluation, so a stale snapshot can never be applied after a newer one
//! - Failures: fetch errors are logged and the pass is dropped; the timer keeps going
//! - Teardown: flips the session's cancellation flag under the same lock that guards the
//!   alerted set, so an in-flight pass cannot alert or mutate state afterwards

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::sync::Mutex as PassGuard;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use pantry_alerts::{AlertSession, PassOutcome};
use pantry_core::UserId;
use pantry_inventory::FoodItem;

use crate::backend::ItemSource;
use crate::clock::Clock;
use crate::config::{ConfigError, SchedulerConfig};
use crate::notify::NotificationSink;

/// What a single pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassResult {
    /// No session is scheduled.
    Inactive,
    /// The backend fetch failed; nothing was evaluated.
    FetchFailed,
    /// The session was torn down while the pass was in flight.
    Cancelled,
    Completed(PassOutcome),
}

#[derive(Debug)]
struct SessionState {
    cancelled: bool,
    session: AlertSession,
}

type SharedState = Arc<Mutex<SessionState>>;

struct ActiveSchedule {
    user_id: UserId,
    state: SharedState,
    task: JoinHandle<()>,
}

/// Periodically re-evaluates a user's inventory and raises expiry alerts.
///
/// Must be used from within a Tokio runtime.
pub struct NotificationScheduler {
    source: Arc<dyn ItemSource>,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
    active: Mutex<Option<ActiveSchedule>>,
    passes: Arc<PassGuard<()>>,
}

impl NotificationScheduler {
    pub fn new(
        source: Arc<dyn ItemSource>,
        sink: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            source,
            sink,
            clock,
            config,
            active: Mutex::new(None),
            passes: Arc::new(PassGuard::new(())),
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Start (or restart) checking `user_id`'s inventory.
    ///
    /// Never leaves two timers running. Re-scheduling the same user replaces
    /// the timer but keeps the alerted set; scheduling another user ends the
    /// previous session first.
    pub fn schedule_notification_check(&self, user_id: UserId) {
        let mut active = lock(&self.active);

        let state = match active.take() {
            Some(prev) if prev.user_id == user_id => {
                prev.task.abort();
                debug!(user = %user_id, "re-arming notification check");
                prev.state
            }
            Some(prev) => {
                info!(from = %prev.user_id, to = %user_id, "switching notification session");
                stop(prev);
                new_state(user_id, &self.config)
            }
            None => new_state(user_id, &self.config),
        };

        let task = tokio::spawn(run_schedule(
            user_id,
            state.clone(),
            self.passes.clone(),
            self.source.clone(),
            self.sink.clone(),
            self.clock.clone(),
            self.config.interval,
        ));

        info!(
            user = %user_id,
            interval_secs = self.config.interval.as_secs(),
            scope = ?self.config.scope,
            "notification check scheduled"
        );

        *active = Some(ActiveSchedule {
            user_id,
            state,
            task,
        });
    }

    /// Stop the active session: cancel its timer and forget its alerted set.
    ///
    /// Returns the user whose session ended, if any.
    pub fn teardown(&self) -> Option<UserId> {
        let prev = lock(&self.active).take()?;
        let user_id = prev.user_id;
        stop(prev);
        info!(user = %user_id, "notification check torn down");
        Some(user_id)
    }

    /// Run one pass right away for the active session.
    ///
    /// Waits for an in-flight timer pass to finish first.
    pub async fn check_now(&self) -> PassResult {
        let (user_id, state) = {
            let active = lock(&self.active);
            match active.as_ref() {
                Some(a) => (a.user_id, a.state.clone()),
                None => return PassResult::Inactive,
            }
        };

        run_pass(
            user_id,
            &state,
            &self.passes,
            self.source.as_ref(),
            self.sink.as_ref(),
            self.clock.as_ref(),
        )
        .await
    }

    pub fn active_user(&self) -> Option<UserId> {
        lock(&self.active).as_ref().map(|a| a.user_id)
    }

    /// Size of the active session's alerted set.
    pub fn alerted_count(&self) -> Option<usize> {
        let active = lock(&self.active);
        active
            .as_ref()
            .map(|a| lock(&a.state).session.alerted_len())
    }
}

impl Drop for NotificationScheduler {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn new_state(user_id: UserId, config: &SchedulerConfig) -> SharedState {
    Arc::new(Mutex::new(SessionState {
        cancelled: false,
        session: AlertSession::new(user_id, config.scope),
    }))
}

fn stop(schedule: ActiveSchedule) {
    {
        let mut state = lock(&schedule.state);
        state.cancelled = true;
        state.session.clear();
    }
    schedule.task.abort();
}

async fn run_schedule(
    user_id: UserId,
    state: SharedState,
    passes: Arc<PassGuard<()>>,
    source: Arc<dyn ItemSource>,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    interval: Duration,
) {
    // First tick completes immediately.
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let result = run_pass(
            user_id,
            &state,
            &passes,
            source.as_ref(),
            sink.as_ref(),
            clock.as_ref(),
        )
        .await;
        if result == PassResult::Cancelled {
            break;
        }
    }

    debug!(user = %user_id, "notification check loop stopped");
}

async fn run_pass(
    user_id: UserId,
    state: &Mutex<SessionState>,
    passes: &PassGuard<()>,
    source: &dyn ItemSource,
    sink: &dyn NotificationSink,
    clock: &dyn Clock,
) -> PassResult {
    let _pass = passes.lock().await;
    if lock(state).cancelled {
        return PassResult::Cancelled;
    }

    // One instant for the whole pass.
    let now = clock.now();

    let items = match source.fetch_user_items(user_id).await {
        Ok(items) => items,
        Err(err) => {
            warn!(user = %user_id, error = %err, "expiry check failed to fetch items");
            return PassResult::FetchFailed;
        }
    };

    apply_pass(user_id, state, &items, now, sink)
}

fn apply_pass(
    user_id: UserId,
    state: &Mutex<SessionState>,
    items: &[FoodItem],
    now: NaiveDateTime,
    sink: &dyn NotificationSink,
) -> PassResult {
    let mut state = lock(state);
    if state.cancelled {
        debug!(user = %user_id, "discarding pass for a torn-down session");
        return PassResult::Cancelled;
    }

    let outcome = state.session.evaluate(items, now);

    if outcome.foreign > 0 {
        warn!(user = %user_id, foreign = outcome.foreign, "ignored items owned by another user");
    }

    for alert in &outcome.alerts {
        sink.emit(&alert.title(), &alert.body());
    }

    debug!(
        user = %user_id,
        evaluated = outcome.evaluated,
        alerts = outcome.alerts.len(),
        "expiry check completed"
    );

    PassResult::Completed(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, NaiveDate};
    use tokio::sync::{Semaphore, mpsc};

    use pantry_alerts::AlertScope;
    use pantry_inventory::{FoodCategory, Quantity};

    use crate::backend::{FetchError, InMemoryItemStore};
    use crate::clock::FixedClock;
    use crate::notify::InMemoryNotificationSink;

    const INTERVAL: Duration = Duration::from_secs(60);

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn morning() -> NaiveDateTime {
        today().and_hms_opt(9, 0, 0).unwrap()
    }

    fn item(owner: UserId, name: &str, offset: i64) -> FoodItem {
        FoodItem::new(
            owner,
            name,
            FoodCategory::Dairy,
            Quantity::new(1.0, "pcs"),
            today() + ChronoDuration::days(offset),
            today() - ChronoDuration::days(5),
        )
    }

    struct Harness {
        store: Arc<InMemoryItemStore>,
        sink: Arc<InMemoryNotificationSink>,
        clock: Arc<FixedClock>,
        scheduler: NotificationScheduler,
    }

    fn harness(items: Vec<FoodItem>, scope: AlertScope) -> Harness {
        let store = Arc::new(InMemoryItemStore::with_items(items));
        let sink = Arc::new(InMemoryNotificationSink::new());
        let clock = Arc::new(FixedClock::new(morning()));
        let scheduler = NotificationScheduler::new(
            store.clone(),
            sink.clone(),
            clock.clone(),
            SchedulerConfig::default()
                .with_interval(INTERVAL)
                .with_scope(scope),
        )
        .unwrap();
        Harness {
            store,
            sink,
            clock,
            scheduler,
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn first_pass_runs_immediately() {
        let user = UserId::new();
        let h = harness(vec![item(user, "Yogurt", -1)], AlertScope::Session);

        h.scheduler.schedule_notification_check(user);
        settle().await;

        assert_eq!(h.store.fetch_count(), 1);
        let sent = h.sink.all();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].title, "Expired: Yogurt");
        assert_eq!(sent[0].body, "Yogurt expired yesterday.");
    }

    #[tokio::test(start_paused = true)]
    async fn scheduling_twice_keeps_a_single_timer() {
        let user = UserId::new();
        let h = harness(vec![item(user, "Cream", 0)], AlertScope::Session);

        h.scheduler.schedule_notification_check(user);
        h.scheduler.schedule_notification_check(user);
        tokio::time::sleep(INTERVAL * 3 + INTERVAL / 2).await;

        // Passes at 0, 1, 2 and 3 intervals.
        assert_eq!(h.store.fetch_count(), 4);
        assert_eq!(h.sink.len(), 1);
        assert_eq!(h.scheduler.alerted_count(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn steady_expired_item_alerts_once() {
        let user = UserId::new();
        let h = harness(vec![item(user, "Ham", -3)], AlertScope::Session);

        h.scheduler.schedule_notification_check(user);
        tokio::time::sleep(INTERVAL * 5 + INTERVAL / 2).await;

        assert_eq!(h.store.fetch_count(), 6);
        assert_eq!(h.sink.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn danger_safe_danger_alerts_twice() {
        let user = UserId::new();
        let mut milk = item(user, "Milk", 0);
        let h = harness(vec![milk.clone()], AlertScope::Session);

        h.scheduler.schedule_notification_check(user);
        settle().await;
        assert_eq!(h.sink.len(), 1);

        milk.expiry_date = today() + ChronoDuration::days(10);
        h.store.insert(milk.clone());
        tokio::time::sleep(INTERVAL).await;
        assert_eq!(h.sink.len(), 1);

        milk.expiry_date = today();
        h.store.insert(milk.clone());
        tokio::time::sleep(INTERVAL).await;
        assert_eq!(h.sink.len(), 2);
        assert_eq!(h.store.fetch_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failure_is_swallowed_and_next_pass_recovers() {
        let user = UserId::new();
        let h = harness(vec![item(user, "Tofu", 1)], AlertScope::Session);
        h.store
            .set_failure(Some(FetchError::network("backend unreachable")));

        h.scheduler.schedule_notification_check(user);
        settle().await;
        assert_eq!(h.store.fetch_count(), 1);
        assert!(h.sink.is_empty());
        assert_eq!(h.scheduler.active_user(), Some(user));

        h.store.set_failure(None);
        tokio::time::sleep(INTERVAL).await;
        assert_eq!(h.sink.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn switching_users_starts_a_fresh_alerted_set() {
        let alice = UserId::new();
        let bob = UserId::new();
        let h = harness(
            vec![item(alice, "Brie", -1), item(bob, "Feta", -1)],
            AlertScope::Session,
        );

        h.scheduler.schedule_notification_check(alice);
        settle().await;
        h.scheduler.schedule_notification_check(bob);
        settle().await;
        assert_eq!(h.scheduler.active_user(), Some(bob));
        assert_eq!(h.sink.len(), 2);

        h.scheduler.schedule_notification_check(alice);
        settle().await;
        let titles: Vec<_> = h.sink.all().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["Expired: Brie", "Expired: Feta", "Expired: Brie"]);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_stops_the_timer() {
        let user = UserId::new();
        let h = harness(vec![item(user, "Kefir", 8)], AlertScope::Session);

        h.scheduler.schedule_notification_check(user);
        settle().await;
        assert_eq!(h.scheduler.teardown(), Some(user));

        tokio::time::sleep(INTERVAL * 3).await;
        assert_eq!(h.store.fetch_count(), 1);
        assert_eq!(h.scheduler.active_user(), None);
        assert_eq!(h.scheduler.teardown(), None);
        assert_eq!(h.scheduler.check_now().await, PassResult::Inactive);
    }

    #[tokio::test(start_paused = true)]
    async fn calendar_day_scope_repeats_on_the_next_day() {
        let user = UserId::new();
        let h = harness(vec![item(user, "Pesto", -1)], AlertScope::CalendarDay);

        h.scheduler.schedule_notification_check(user);
        settle().await;
        assert_eq!(h.sink.len(), 1);

        assert!(matches!(h.scheduler.check_now().await, PassResult::Completed(o) if o.alerts.is_empty()));

        h.clock.advance(ChronoDuration::days(1));
        assert!(matches!(h.scheduler.check_now().await, PassResult::Completed(o) if o.alerts.len() == 1));
        assert_eq!(h.sink.len(), 2);
    }

    #[test]
    fn zero_interval_is_rejected_up_front() {
        let err = NotificationScheduler::new(
            Arc::new(InMemoryItemStore::new()),
            Arc::new(InMemoryNotificationSink::new()),
            Arc::new(FixedClock::new(morning())),
            SchedulerConfig::default().with_interval(Duration::ZERO),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    /// Source that snapshots its items when a fetch starts, then blocks until
    /// the test releases it.
    struct GatedSource {
        items: Mutex<Vec<FoodItem>>,
        started: mpsc::UnboundedSender<()>,
        release: Semaphore,
    }

    impl GatedSource {
        fn new(items: Vec<FoodItem>, started: mpsc::UnboundedSender<()>) -> Self {
            Self {
                items: Mutex::new(items),
                started,
                release: Semaphore::new(0),
            }
        }

        fn replace(&self, items: Vec<FoodItem>) {
            *lock(&self.items) = items;
        }
    }

    #[async_trait]
    impl ItemSource for GatedSource {
        async fn fetch_user_items(&self, _user_id: UserId) -> Result<Vec<FoodItem>, FetchError> {
            let snapshot = lock(&self.items).clone();
            let _ = self.started.send(());
            let _permit = self
                .release
                .acquire()
                .await
                .map_err(|e| FetchError::network(e.to_string()))?;
            Ok(snapshot)
        }
    }

    fn gated_scheduler(
        source: Arc<GatedSource>,
        sink: Arc<InMemoryNotificationSink>,
    ) -> Arc<NotificationScheduler> {
        Arc::new(
            NotificationScheduler::new(
                source,
                sink,
                Arc::new(FixedClock::new(morning())),
                SchedulerConfig::default(),
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn teardown_mid_pass_discards_the_pass() {
        let user = UserId::new();
        let (started_tx, mut started_rx) = mpsc::unbounded_channel();
        let source = Arc::new(GatedSource::new(vec![item(user, "Sushi", -1)], started_tx));
        let sink = Arc::new(InMemoryNotificationSink::new());
        let scheduler = gated_scheduler(source.clone(), sink.clone());

        scheduler.schedule_notification_check(user);
        started_rx.recv().await.unwrap();

        let manual = tokio::spawn({
            let scheduler = scheduler.clone();
            async move { scheduler.check_now().await }
        });
        // Let the manual pass pick up the session and queue behind the timer pass.
        tokio::task::yield_now().await;

        scheduler.teardown();
        source.release.add_permits(2);

        assert_eq!(manual.await.unwrap(), PassResult::Cancelled);
        assert!(sink.is_empty());
        assert_eq!(scheduler.alerted_count(), None);
    }

    #[tokio::test]
    async fn manual_check_waits_for_the_in_flight_pass() {
        let user = UserId::new();
        let mut milk = item(user, "Milk", 1);
        let (started_tx, mut started_rx) = mpsc::unbounded_channel();
        let source = Arc::new(GatedSource::new(vec![milk.clone()], started_tx));
        let sink = Arc::new(InMemoryNotificationSink::new());
        let scheduler = gated_scheduler(source.clone(), sink.clone());

        // Timer pass holds a danger snapshot.
        scheduler.schedule_notification_check(user);
        started_rx.recv().await.unwrap();

        // The item has since been pushed out to safe.
        milk.expiry_date = today() + ChronoDuration::days(20);
        source.replace(vec![milk]);

        let manual = tokio::spawn({
            let scheduler = scheduler.clone();
            async move { scheduler.check_now().await }
        });
        tokio::task::yield_now().await;
        source.release.add_permits(2);

        match manual.await.unwrap() {
            PassResult::Completed(outcome) => assert!(outcome.alerts.is_empty()),
            other => panic!("unexpected pass result: {other:?}"),
        }
        // Only the older danger snapshot alerted, and it was applied first.
        assert_eq!(sink.len(), 1);
        assert_eq!(scheduler.alerted_count(), Some(0));
    }
}
