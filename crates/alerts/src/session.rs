use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};

use pantry_core::{ItemId, UserId};
use pantry_inventory::{ExpiryStatus, FoodItem, classify, days_remaining};

use crate::alert::ExpiryAlert;
use crate::scope::AlertScope;

/// Result of evaluating one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassOutcome {
    /// Alerts to deliver, in input order.
    pub alerts: Vec<ExpiryAlert>,
    /// Items owned by the session user that were classified.
    pub evaluated: usize,
    /// Items that belong to another user and were ignored.
    pub foreign: usize,
}

/// De-duplication state for one user's alert session.
///
/// Holds the alerted set: `(item, status)` pairs already delivered. A pair is
/// recorded when its alert is produced and forgotten as soon as the item
/// classifies differently (or disappears), so any later move into an
/// alertable status alerts again.
#[derive(Debug, Clone)]
pub struct AlertSession {
    user_id: UserId,
    scope: AlertScope,
    alerted: HashSet<(ItemId, ExpiryStatus)>,
    last_pass_day: Option<NaiveDate>,
}

impl AlertSession {
    pub fn new(user_id: UserId, scope: AlertScope) -> Self {
        Self {
            user_id,
            scope,
            alerted: HashSet::new(),
            last_pass_day: None,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn scope(&self) -> AlertScope {
        self.scope
    }

    pub fn alerted_len(&self) -> usize {
        self.alerted.len()
    }

    pub fn was_alerted(&self, item_id: ItemId, status: ExpiryStatus) -> bool {
        self.alerted.contains(&(item_id, status))
    }

    /// Forget every delivered alert (session end).
    pub fn clear(&mut self) {
        self.alerted.clear();
        self.last_pass_day = None;
    }

    /// Evaluate one pass over `items`, all classified against the same `now`.
    ///
    /// Items owned by someone else are never alerted. `items` is the user's
    /// whole inventory: pairs for items it no longer contains are dropped.
    pub fn evaluate(&mut self, items: &[FoodItem], now: NaiveDateTime) -> PassOutcome {
        if self.scope == AlertScope::CalendarDay && self.last_pass_day != Some(now.date()) {
            self.alerted.clear();
        }
        self.last_pass_day = Some(now.date());

        let mut outcome = PassOutcome::default();
        let mut present = HashSet::new();

        for item in items {
            if !item.is_owned_by(self.user_id) {
                outcome.foreign += 1;
                continue;
            }
            outcome.evaluated += 1;
            present.insert(item.id);

            // At most one pair per item: the status it currently holds.
            let status = classify(item.expiry_date, now);
            self.alerted.retain(|(id, s)| *id != item.id || *s == status);
            if !status.is_alertable() {
                continue;
            }

            if self.alerted.insert((item.id, status)) {
                outcome.alerts.push(ExpiryAlert {
                    item_id: item.id,
                    item_name: item.name.clone(),
                    status,
                    days_remaining: days_remaining(item.expiry_date, now),
                });
            }
        }

        self.alerted.retain(|(id, _)| present.contains(id));

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveTime};
    use pantry_inventory::{FoodCategory, Quantity};
    use proptest::prelude::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn at(date: NaiveDate, hour: u32) -> NaiveDateTime {
        date.and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap())
    }

    fn item(owner: UserId, name: &str, expiry_date: NaiveDate) -> FoodItem {
        FoodItem::new(
            owner,
            name,
            FoodCategory::Produce,
            Quantity::new(2.0, "pcs"),
            expiry_date,
            today() - Duration::days(3),
        )
    }

    #[test]
    fn first_pass_alerts_danger_and_expired_only() {
        let user = UserId::new();
        let items = vec![
            item(user, "Lettuce", today() - Duration::days(1)),
            item(user, "Tomatoes", today()),
            item(user, "Carrots", today() + Duration::days(2)),
            item(user, "Potatoes", today() + Duration::days(30)),
        ];

        let mut session = AlertSession::new(user, AlertScope::Session);
        let outcome = session.evaluate(&items, at(today(), 9));

        let statuses: Vec<_> = outcome.alerts.iter().map(|a| a.status).collect();
        assert_eq!(statuses, vec![ExpiryStatus::Expired, ExpiryStatus::Danger]);
        assert_eq!(outcome.evaluated, 4);
        assert_eq!(session.alerted_len(), 2);
    }

    #[test]
    fn recovery_then_relapse_alerts_twice() {
        let user = UserId::new();
        let mut milk = item(user, "Milk", today());
        let mut session = AlertSession::new(user, AlertScope::Session);

        let first = session.evaluate(std::slice::from_ref(&milk), at(today(), 8));
        assert_eq!(first.alerts.len(), 1);

        // Expiry date corrected upwards: item is safe again.
        milk.expiry_date = today() + Duration::days(10);
        let second = session.evaluate(std::slice::from_ref(&milk), at(today(), 9));
        assert!(second.alerts.is_empty());
        assert!(!session.was_alerted(milk.id, ExpiryStatus::Danger));

        milk.expiry_date = today() + Duration::days(1);
        let third = session.evaluate(std::slice::from_ref(&milk), at(today(), 10));
        assert_eq!(third.alerts.len(), 1);
        assert_eq!(third.alerts[0].status, ExpiryStatus::Danger);
    }

    #[test]
    fn danger_then_expired_is_a_new_alert() {
        let user = UserId::new();
        let bread = item(user, "Bread", today() + Duration::days(1));
        let mut session = AlertSession::new(user, AlertScope::Session);

        let mut statuses = Vec::new();
        for day in 0..4 {
            let now = at(today() + Duration::days(day), 12);
            for alert in session.evaluate(std::slice::from_ref(&bread), now).alerts {
                statuses.push(alert.status);
            }
        }

        assert_eq!(statuses, vec![ExpiryStatus::Danger, ExpiryStatus::Expired]);
    }

    #[test]
    fn expired_danger_expired_alerts_three_times() {
        let user = UserId::new();
        let mut stew = item(user, "Stew", today() - Duration::days(1));
        let mut session = AlertSession::new(user, AlertScope::Session);
        let now = at(today(), 12);

        let mut statuses = Vec::new();
        for offset in [-1, 1, -1] {
            stew.expiry_date = today() + Duration::days(offset);
            for alert in session.evaluate(std::slice::from_ref(&stew), now).alerts {
                statuses.push(alert.status);
            }
        }

        assert_eq!(
            statuses,
            vec![ExpiryStatus::Expired, ExpiryStatus::Danger, ExpiryStatus::Expired]
        );
        assert_eq!(session.alerted_len(), 1);
    }

    #[test]
    fn deleted_items_are_forgotten() {
        let user = UserId::new();
        let rice = item(user, "Rice", today() - Duration::days(2));
        let beans = item(user, "Beans", today());
        let mut session = AlertSession::new(user, AlertScope::Session);

        session.evaluate(&[rice.clone(), beans.clone()], at(today(), 9));
        assert_eq!(session.alerted_len(), 2);

        let outcome = session.evaluate(std::slice::from_ref(&beans), at(today(), 10));
        assert!(outcome.alerts.is_empty());
        assert_eq!(session.alerted_len(), 1);
        assert!(!session.was_alerted(rice.id, ExpiryStatus::Expired));
    }

    #[test]
    fn foreign_items_are_never_alerted() {
        let user = UserId::new();
        let stranger = UserId::new();
        let items = vec![item(stranger, "Cream", today() - Duration::days(5))];

        let mut session = AlertSession::new(user, AlertScope::Session);
        let outcome = session.evaluate(&items, at(today(), 9));
        assert!(outcome.alerts.is_empty());
        assert_eq!(outcome.foreign, 1);
        assert_eq!(session.alerted_len(), 0);
    }

    #[test]
    fn calendar_day_scope_repeats_alert_on_a_new_day() {
        let user = UserId::new();
        let items = vec![item(user, "Fish", today() - Duration::days(1))];

        let mut per_session = AlertSession::new(user, AlertScope::Session);
        let mut per_day = AlertSession::new(user, AlertScope::CalendarDay);

        let mut session_alerts = 0;
        let mut day_alerts = 0;
        for now in [at(today(), 9), at(today(), 18), at(today() + Duration::days(1), 9)] {
            session_alerts += per_session.evaluate(&items, now).alerts.len();
            day_alerts += per_day.evaluate(&items, now).alerts.len();
        }

        assert_eq!(session_alerts, 1);
        assert_eq!(day_alerts, 2);
    }

    #[test]
    fn clear_forgets_everything() {
        let user = UserId::new();
        let items = vec![item(user, "Eggs", today())];
        let mut session = AlertSession::new(user, AlertScope::Session);

        assert_eq!(session.evaluate(&items, at(today(), 9)).alerts.len(), 1);
        session.clear();
        assert_eq!(session.alerted_len(), 0);
        assert_eq!(session.evaluate(&items, at(today(), 10)).alerts.len(), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: an item stuck in one alertable status alerts exactly once,
        /// however many passes run.
        #[test]
        fn stable_status_alerts_once(passes in 1usize..40, expired_days in 1i64..60) {
            let user = UserId::new();
            let items = vec![item(user, "Ham", today() - Duration::days(expired_days))];
            let mut session = AlertSession::new(user, AlertScope::Session);

            let total: usize = (0..passes)
                .map(|i| session.evaluate(&items, at(today(), (i % 24) as u32)).alerts.len())
                .sum();

            prop_assert_eq!(total, 1);
        }
    }
}
