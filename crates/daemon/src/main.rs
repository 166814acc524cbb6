use std::sync::Arc;

use pantry_daemon::DaemonConfig;
use pantry_infra::{SystemClock, TracingNotificationSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            return Err(err.into());
        }
    }

    pantry_observability::init();

    let config = DaemonConfig::from_env()?;

    pantry_daemon::run(
        config,
        Arc::new(TracingNotificationSink),
        Arc::new(SystemClock),
        async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "failed to listen for ctrl-c");
            }
        },
    )
    .await
}
