//! Observability utilities for the cloud inventory and audit services.
//!
//! This crate provides:
//! - Prometheus recorder installation and exposition rendering
//! - Resource sync and state change metrics
//! - Audit rule execution metrics
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{init_metrics, render_metrics, ResourceMetrics};
//!
//! init_metrics()?;
//! ResourceMetrics::record_sync_started("gcp");
//! let body = render_metrics();
//! ```

pub mod audit;
pub mod resources;

pub use audit::AuditMetrics;
pub use resources::ResourceMetrics;

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Initialize the Prometheus metrics recorder.
///
/// Installs the global recorder on the first call; later calls return the
/// same handle.
pub fn init_metrics() -> Result<&'static PrometheusHandle, BuildError> {
    METRICS_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new().install_recorder()?;

        info!("Prometheus metrics recorder initialized");
        register_metric_descriptions();

        Ok(handle)
    })
}

/// Get the metrics handle (must call init_metrics first)
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Render the Prometheus exposition text for a `/metrics` endpoint
pub fn render_metrics() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

fn register_metric_descriptions() {
    use metrics::describe_counter;
    use metrics::describe_gauge;
    use metrics::describe_histogram;

    // Inventory
    describe_gauge!(
        "cloud_resources_total",
        "Resources in the stored inventory after the last sync, by provider"
    );
    describe_counter!(
        "resource_sync_operations_total",
        "Resource sync operations by provider and status"
    );
    describe_histogram!(
        "resource_sync_duration_seconds",
        "Resource sync duration in seconds"
    );
    describe_counter!(
        "resource_changes_total",
        "Inventory writes applied by reconciliation, by change type"
    );
    describe_counter!(
        "resource_change_failures_total",
        "Inventory writes that failed during reconciliation"
    );
    describe_counter!(
        "resource_state_changes_total",
        "Start/stop requests sent to providers, by outcome"
    );

    // Audit
    describe_counter!(
        "audit_rule_runs_total",
        "Audit rule executions by rule, category and outcome"
    );
    describe_histogram!(
        "audit_rule_duration_seconds",
        "Audit rule execution duration in seconds"
    );
    describe_gauge!(
        "audit_rule_findings",
        "Items reported by the last run of a rule"
    );
    describe_counter!(
        "audit_result_write_failures_total",
        "Audit result updates that could not be persisted"
    );
}
