//! Inventory analytics roll-up.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use pantry_core::ItemId;

use crate::expiry::{ExpiryStatus, classify, days_remaining};
use crate::item::{FoodCategory, FoodItem};

/// Default number of entries kept in [`ExpirySummary::upcoming`].
pub const DEFAULT_UPCOMING_LIMIT: usize = 5;

/// An item that has not expired yet, ordered by how soon it will.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingExpiry {
    pub item_id: ItemId,
    pub name: String,
    pub expiry_date: NaiveDate,
    pub days_remaining: i64,
    pub status: ExpiryStatus,
}

/// Counts per status and category for one user's inventory at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpirySummary {
    pub total: usize,
    pub by_status: BTreeMap<ExpiryStatus, usize>,
    pub by_category: BTreeMap<FoodCategory, usize>,
    pub upcoming: Vec<UpcomingExpiry>,
}

impl ExpirySummary {
    pub fn build(items: &[FoodItem], now: NaiveDateTime) -> Self {
        Self::build_with_limit(items, now, DEFAULT_UPCOMING_LIMIT)
    }

    pub fn build_with_limit(items: &[FoodItem], now: NaiveDateTime, limit: usize) -> Self {
        let mut by_status: BTreeMap<ExpiryStatus, usize> =
            ExpiryStatus::ALL.into_iter().map(|s| (s, 0)).collect();
        let mut by_category: BTreeMap<FoodCategory, usize> = BTreeMap::new();
        let mut upcoming = Vec::new();

        for item in items {
            let days = days_remaining(item.expiry_date, now);
            let status = classify(item.expiry_date, now);

            *by_status.entry(status).or_default() += 1;
            *by_category.entry(item.category).or_default() += 1;

            if status != ExpiryStatus::Expired {
                upcoming.push(UpcomingExpiry {
                    item_id: item.id,
                    name: item.name.clone(),
                    expiry_date: item.expiry_date,
                    days_remaining: days,
                    status,
                });
            }
        }

        // Ties broken by name so the output is stable across backends.
        upcoming.sort_by(|a, b| {
            a.days_remaining
                .cmp(&b.days_remaining)
                .then_with(|| a.name.cmp(&b.name))
        });
        upcoming.truncate(limit);

        Self {
            total: items.len(),
            by_status,
            by_category,
            upcoming,
        }
    }

    pub fn count(&self, status: ExpiryStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    /// Items that currently warrant an alert.
    pub fn needs_attention(&self) -> usize {
        self.count(ExpiryStatus::Danger) + self.count(ExpiryStatus::Expired)
    }
}
