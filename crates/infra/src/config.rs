//! Scheduler configuration loading.
//!
//! Values come from environment variables with defaults:
//! - `PANTRY_CHECK_INTERVAL_SECS`: seconds between passes (default 300, > 0)
//! - `PANTRY_ALERT_SCOPE`: `session` (default) or `day`

use std::time::Duration;

use thiserror::Error;

use pantry_alerts::AlertScope;

pub const CHECK_INTERVAL_VAR: &str = "PANTRY_CHECK_INTERVAL_SECS";
pub const ALERT_SCOPE_VAR: &str = "PANTRY_ALERT_SCOPE";

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(var: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            reason: reason.into(),
        }
    }
}

/// Config for the notification scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Time between passes.
    pub interval: Duration,
    /// How long a delivered alert stays suppressed.
    pub scope: AlertScope,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_CHECK_INTERVAL,
            scope: AlertScope::Session,
        }
    }
}

impl SchedulerConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_scope(mut self, scope: AlertScope) -> Self {
        self.scope = scope;
        self
    }

    /// Reject values the scheduler cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::invalid(CHECK_INTERVAL_VAR, "must be greater than zero"));
        }
        Ok(())
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load using `lookup` to resolve variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(raw) = lookup(CHECK_INTERVAL_VAR) {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid(CHECK_INTERVAL_VAR, format!("{e}")))?;
            cfg.interval = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup(ALERT_SCOPE_VAR) {
            cfg.scope = raw
                .parse()
                .map_err(|e| ConfigError::invalid(ALERT_SCOPE_VAR, format!("{e}")))?;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}
