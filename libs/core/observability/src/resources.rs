//! Inventory metrics: sync runs, reconciliation writes, state changes.

use metrics::{counter, gauge, histogram};

/// Resource metrics recorder
pub struct ResourceMetrics;

impl ResourceMetrics {
    // =========================================================================
    // Inventory
    // =========================================================================

    /// Set the stored inventory size of one account after a sync
    pub fn set_resources_count(provider: &str, count: usize) {
        gauge!("cloud_resources_total", "provider" => provider.to_string()).set(count as f64);
    }

    // =========================================================================
    // Sync
    // =========================================================================

    pub fn record_sync_started(provider: &str) {
        counter!(
            "resource_sync_operations_total",
            "provider" => provider.to_string(),
            "status" => "started"
        )
        .increment(1);

        tracing::debug!(provider = provider, "Resource sync started");
    }

    pub fn record_sync_completed(provider: &str, resources_synced: usize, duration_secs: f64) {
        counter!(
            "resource_sync_operations_total",
            "provider" => provider.to_string(),
            "status" => "completed"
        )
        .increment(1);

        histogram!(
            "resource_sync_duration_seconds",
            "provider" => provider.to_string()
        )
        .record(duration_secs);

        tracing::info!(
            provider = provider,
            resources_synced = resources_synced,
            duration_secs = duration_secs,
            "Resource sync completed"
        );
    }

    pub fn record_sync_failed(provider: &str, error: &str) {
        counter!(
            "resource_sync_operations_total",
            "provider" => provider.to_string(),
            "status" => "failed"
        )
        .increment(1);

        tracing::error!(provider = provider, error = error, "Resource sync failed");
    }

    // =========================================================================
    // Reconciliation writes
    // =========================================================================

    pub fn record_resource_created(provider: &str, resource_type: &str) {
        Self::record_change(provider, resource_type, "created");
    }

    pub fn record_resource_updated(provider: &str, resource_type: &str) {
        Self::record_change(provider, resource_type, "updated");
    }

    pub fn record_resource_deleted(provider: &str, resource_type: &str) {
        Self::record_change(provider, resource_type, "deleted");
    }

    /// Record a reconciliation write that failed and was skipped
    pub fn record_change_failed(provider: &str, change_type: &'static str) {
        counter!(
            "resource_change_failures_total",
            "provider" => provider.to_string(),
            "change_type" => change_type
        )
        .increment(1);
    }

    fn record_change(provider: &str, resource_type: &str, change_type: &'static str) {
        counter!(
            "resource_changes_total",
            "provider" => provider.to_string(),
            "resource_type" => resource_type.to_string(),
            "change_type" => change_type
        )
        .increment(1);
    }

    // =========================================================================
    // State changes
    // =========================================================================

    /// Record a start/stop request sent to a provider
    pub fn record_state_change(provider: &str, target_status: &str, success: bool) {
        counter!(
            "resource_state_changes_total",
            "provider" => provider.to_string(),
            "target_status" => target_status.to_string(),
            "outcome" => if success { "success" } else { "failure" }
        )
        .increment(1);
    }
}
