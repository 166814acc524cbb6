use core::str::FromStr;

use serde::{Deserialize, Serialize};

use pantry_core::DomainError;

/// How long a delivered alert stays suppressed.
///
/// - `Session`: until the session ends (logout / teardown).
/// - `CalendarDay`: additionally forgotten when a pass runs on a new calendar date,
///   so an item still expired tomorrow is announced again tomorrow.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertScope {
    #[default]
    Session,
    CalendarDay,
}

impl FromStr for AlertScope {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "session" => Ok(AlertScope::Session),
            "day" | "calendar_day" => Ok(AlertScope::CalendarDay),
            other => Err(DomainError::validation(format!(
                "unknown alert scope '{other}' (expected session or day)"
            ))),
        }
    }
}
