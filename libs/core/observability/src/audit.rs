//! Audit rule execution metrics.

use metrics::{counter, gauge, histogram};

/// Audit metrics recorder
pub struct AuditMetrics;

impl AuditMetrics {
    /// Record a rule that executed and produced `findings` items
    pub fn record_rule_completed(rule: &str, category: &str, findings: usize, duration_secs: f64) {
        counter!(
            "audit_rule_runs_total",
            "rule" => rule.to_string(),
            "category" => category.to_string(),
            "outcome" => "completed"
        )
        .increment(1);

        histogram!("audit_rule_duration_seconds", "rule" => rule.to_string())
            .record(duration_secs);

        gauge!("audit_rule_findings", "rule" => rule.to_string()).set(findings as f64);
    }

    /// Record a rule whose execution failed, leaving its result pending
    pub fn record_rule_failed(rule: &str, category: &str) {
        counter!(
            "audit_rule_runs_total",
            "rule" => rule.to_string(),
            "category" => category.to_string(),
            "outcome" => "failed"
        )
        .increment(1);
    }

    pub fn record_result_write_failed(rule: &str) {
        counter!("audit_result_write_failures_total", "rule" => rule.to_string()).increment(1);
    }
}
