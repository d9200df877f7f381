use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);

    metrics::describe_counter!("attempts_started_total", "Quiz attempts created");
    metrics::describe_counter!(
        "attempts_submitted_total",
        "Quiz attempts finalized, labeled by submit mode"
    );
    metrics::describe_counter!("submissions_graded_total", "Assignment submissions graded");
    metrics::describe_counter!(
        "course_grades_recalculated_total",
        "Materialized course grade rows recomputed"
    );
    metrics::describe_counter!(
        "expired_attempts_closed_total",
        "Expired attempts closed by the background sweep"
    );

    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}
