//! Built-in audit rules.

pub mod overprovision;

use core_config::AuditConfig;
use domain_cloud_resources::ProviderRegistry;
use std::sync::Arc;

use crate::rule::AuditRule;

pub use overprovision::SqlInstancePeak;

/// Rules shipped with the engine
pub fn builtin_rules(config: &AuditConfig, providers: Arc<ProviderRegistry>) -> Vec<Arc<dyn AuditRule>> {
    vec![Arc::new(SqlInstancePeak::new(config, providers))]
}
