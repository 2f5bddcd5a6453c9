use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

pub(crate) const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub(crate) const TASKS_CREATED_TOTAL: &str = "tasks_created_total";
pub(crate) const PROOFS_UPLOADED_TOTAL: &str = "proofs_uploaded_total";
pub(crate) const TASKS_MARKED_DUE_TOTAL: &str = "tasks_marked_due_total";
pub(crate) const TASKS_SWEPT_TOTAL: &str = "tasks_swept_total";

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);

    metrics::describe_counter!(HTTP_REQUESTS_TOTAL, "HTTP requests served, by method and status");
    metrics::describe_counter!(TASKS_CREATED_TOTAL, "Tasks assigned by administrators");
    metrics::describe_counter!(PROOFS_UPLOADED_TOTAL, "Proof images attached to tasks");
    metrics::describe_counter!(TASKS_MARKED_DUE_TOTAL, "Tasks moved to due by the sweep");
    metrics::describe_counter!(TASKS_SWEPT_TOTAL, "Completed tasks deleted by the sweep");
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}
