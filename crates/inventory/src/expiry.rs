//! Expiry classification.
//!
//! Status is a pure function of `(expiry_date, now)`. It is never stored, so it
//! cannot go stale across a day boundary.

use core::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use pantry_core::DomainError;

/// Days remaining at or below which an item is in danger.
pub const DANGER_MAX_DAYS: i64 = 1;
/// Days remaining at or below which an item is in warning.
pub const WARNING_MAX_DAYS: i64 = 3;

/// Derived freshness of an item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpiryStatus {
    Safe,
    Warning,
    Danger,
    Expired,
}

impl ExpiryStatus {
    pub const ALL: [ExpiryStatus; 4] = [
        ExpiryStatus::Safe,
        ExpiryStatus::Warning,
        ExpiryStatus::Danger,
        ExpiryStatus::Expired,
    ];

    /// Map a calendar-day distance onto a status.
    pub fn from_days_remaining(days: i64) -> Self {
        if days < 0 {
            ExpiryStatus::Expired
        } else if days <= DANGER_MAX_DAYS {
            ExpiryStatus::Danger
        } else if days <= WARNING_MAX_DAYS {
            ExpiryStatus::Warning
        } else {
            ExpiryStatus::Safe
        }
    }

    /// Whether the notification scheduler raises an alert for this status.
    pub fn is_alertable(self) -> bool {
        matches!(self, ExpiryStatus::Danger | ExpiryStatus::Expired)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExpiryStatus::Safe => "safe",
            ExpiryStatus::Warning => "warning",
            ExpiryStatus::Danger => "danger",
            ExpiryStatus::Expired => "expired",
        }
    }

    /// Human-facing label.
    pub fn label(self) -> &'static str {
        match self {
            ExpiryStatus::Safe => "Fresh",
            ExpiryStatus::Warning => "Expiring soon",
            ExpiryStatus::Danger => "Use now",
            ExpiryStatus::Expired => "Expired",
        }
    }
}

impl core::fmt::Display for ExpiryStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpiryStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "safe" => Ok(ExpiryStatus::Safe),
            "warning" => Ok(ExpiryStatus::Warning),
            "danger" => Ok(ExpiryStatus::Danger),
            "expired" => Ok(ExpiryStatus::Expired),
            other => Err(DomainError::validation(format!(
                "unknown expiry status '{other}' (expected safe, warning, danger or expired)"
            ))),
        }
    }
}

/// Whole calendar days from `now` until `expiry_date`.
///
/// `now` is truncated to its date first, so the time of day never shifts the
/// result. Negative once the expiry date has passed.
pub fn days_remaining(expiry_date: NaiveDate, now: NaiveDateTime) -> i64 {
    expiry_date.signed_duration_since(now.date()).num_days()
}

/// Classify an item's expiry date against `now`.
pub fn classify(expiry_date: NaiveDate, now: NaiveDateTime) -> ExpiryStatus {
    ExpiryStatus::from_days_remaining(days_remaining(expiry_date, now))
}

/// Presentation token for a status.
pub fn status_color(status: ExpiryStatus) -> &'static str {
    match status {
        ExpiryStatus::Safe => "green",
        ExpiryStatus::Warning => "yellow",
        ExpiryStatus::Danger => "orange",
        ExpiryStatus::Expired => "red",
    }
}
