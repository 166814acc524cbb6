//! `pantry-watch`: runs the expiry notification scheduler for one user against
//! a JSON inventory export and logs every notification.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use pantry_core::{DomainError, UserId};
use pantry_infra::{
    Clock, ConfigError, ItemSource, JsonFileItemSource, NotificationScheduler, NotificationSink,
    SchedulerConfig, SessionBinder,
};
use pantry_inventory::{ExpiryStatus, ExpirySummary};

pub const USER_ID_VAR: &str = "PANTRY_USER_ID";
pub const ITEMS_FILE_VAR: &str = "PANTRY_ITEMS_FILE";
pub const DEFAULT_ITEMS_FILE: &str = "pantry.json";

#[derive(Debug, Error)]
pub enum DaemonConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error(transparent)]
    InvalidUser(#[from] DomainError),

    #[error(transparent)]
    Scheduler(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    pub user_id: UserId,
    pub items_file: PathBuf,
    pub scheduler: SchedulerConfig,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self, DaemonConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, DaemonConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let user_id: UserId = lookup(USER_ID_VAR)
            .ok_or(DaemonConfigError::Missing(USER_ID_VAR))?
            .parse()?;

        let items_file = lookup(ITEMS_FILE_VAR).map(PathBuf::from).unwrap_or_else(|| {
            warn!("{ITEMS_FILE_VAR} not set; using {DEFAULT_ITEMS_FILE}");
            PathBuf::from(DEFAULT_ITEMS_FILE)
        });

        let scheduler = SchedulerConfig::from_lookup(&lookup)?;

        Ok(Self {
            user_id,
            items_file,
            scheduler,
        })
    }
}

/// Log a one-off analytics summary of the user's inventory.
pub async fn log_summary(
    source: &dyn ItemSource,
    user_id: UserId,
    clock: &dyn Clock,
) -> Option<ExpirySummary> {
    let items = match source.fetch_user_items(user_id).await {
        Ok(items) => items,
        Err(err) => {
            warn!(user = %user_id, error = %err, "could not load inventory for summary");
            return None;
        }
    };

    let summary = ExpirySummary::build(&items, clock.now());
    info!(
        user = %user_id,
        total = summary.total,
        expired = summary.count(ExpiryStatus::Expired),
        danger = summary.count(ExpiryStatus::Danger),
        warning = summary.count(ExpiryStatus::Warning),
        safe = summary.count(ExpiryStatus::Safe),
        upcoming = %serde_json::to_string(&summary.upcoming).unwrap_or_default(),
        "inventory summary"
    );
    Some(summary)
}

/// Run until `shutdown` resolves, then end the session.
pub async fn run<F>(
    config: DaemonConfig,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    let source = Arc::new(JsonFileItemSource::new(&config.items_file));
    info!(
        user = %config.user_id,
        file = %config.items_file.display(),
        "starting pantry watch"
    );

    log_summary(source.as_ref(), config.user_id, clock.as_ref()).await;

    let scheduler = NotificationScheduler::new(source, sink, clock, config.scheduler)?;
    let binder = Arc::new(SessionBinder::new(Arc::new(scheduler)));
    let (session_tx, session_rx) = watch::channel(Some(config.user_id));

    let driver = tokio::spawn({
        let binder = binder.clone();
        async move { binder.run(session_rx).await }
    });

    shutdown.await;
    info!("shutdown requested");

    // Closing the session channel ends the session and the driver.
    drop(session_tx);
    driver.await?;
    Ok(())
}
