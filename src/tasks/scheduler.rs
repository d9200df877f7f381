use anyhow::Result;
use tokio::sync::watch;
use tokio::time::{interval, Duration};

use crate::core::state::AppState;
use crate::tasks::autosubmit;

pub(crate) async fn run(state: AppState) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweep = tokio::spawn(sweep_loop(state.clone(), shutdown_rx));

    crate::core::shutdown::shutdown_signal().await;
    if shutdown_tx.send(true).is_err() {
        tracing::warn!("Failed to broadcast shutdown signal to background tasks");
    }

    if let Err(err) = sweep.await {
        tracing::error!(error = %err, "Background task join failed");
    }

    Ok(())
}

async fn sweep_loop(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let mut tick = interval(Duration::from_secs(state.settings().attempts().sweep_interval_seconds));
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                if let Err(err) = autosubmit::close_expired_attempts(&state).await {
                    tracing::error!(error = %err, "close_expired_attempts failed");
                }
            }
        }
    }
}
