//! Rules flagging resources sized well above what they use.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use core_config::AuditConfig;
use domain_cloud_resources::{CloudAccount, ProviderRegistry};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::models::Item;
use crate::rule::AuditRule;

pub const CATEGORY: &str = "overprovision";

/// Monitoring metric read by [`SqlInstancePeak`]
pub const CPU_UTILIZATION: &str = "cpu_utilization";

/// Flags SQL instances whose peak CPU utilization over the lookback window
/// stays below a threshold.
pub struct SqlInstancePeak {
    providers: Arc<ProviderRegistry>,
    threshold: f64,
    lookback_days: u32,
}

impl SqlInstancePeak {
    pub const NAME: &'static str = "sql_instance_peak";

    pub fn new(config: &AuditConfig, providers: Arc<ProviderRegistry>) -> Self {
        Self {
            providers,
            threshold: config.sql_peak_cpu_threshold,
            lookback_days: config.lookback_days,
        }
    }
}

#[async_trait]
impl AuditRule for SqlInstancePeak {
    fn category(&self) -> &str {
        CATEGORY
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, account: &CloudAccount) -> Result<Vec<Item>> {
        let Some(clients) = self.providers.get(account.provider) else {
            debug!(provider = %account.provider, "Provider not supported by rule");
            return Ok(vec![]);
        };

        let Some(lister) = clients.sql_lister(&account.credentials).await? else {
            return Ok(vec![]);
        };
        let Some(reader) = clients.metrics_reader(&account.credentials).await? else {
            return Ok(vec![]);
        };

        let instances = lister.list_instances().await?;

        let end = Utc::now();
        let start = end - Duration::days(i64::from(self.lookback_days));
        let series = reader.get_time_series(CPU_UTILIZATION, start, end).await?;

        let mut peaks: HashMap<String, f64> = HashMap::new();
        for s in &series {
            if let Some(peak) = s.peak() {
                peaks
                    .entry(s.resource_name.clone())
                    .and_modify(|p| *p = p.max(peak))
                    .or_insert(peak);
            }
        }

        let items = instances
            .into_iter()
            .filter_map(|instance| {
                let peak = *peaks.get(&instance.name)?;
                (peak < self.threshold).then(|| Item {
                    details: serde_json::json!({
                        "peak_cpu_utilization": peak,
                        "threshold": self.threshold,
                        "lookback_days": self.lookback_days,
                    }),
                    resource_name: instance.name,
                    region: instance.region,
                })
            })
            .collect();

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use domain_cloud_resources::{
        CloudProvider, DataPoint, InstanceLister, MetricsReader, ProviderClients, ProviderError,
        ProviderInstance, ProviderResult, ResourceType, TimeSeries,
    };
    use uuid::Uuid;

    struct Lister(Vec<ProviderInstance>);

    #[async_trait]
    impl InstanceLister for Lister {
        async fn list_instances(&self) -> ProviderResult<Vec<ProviderInstance>> {
            Ok(self.0.clone())
        }
    }

    struct Reader {
        series: Vec<TimeSeries>,
        fail: bool,
    }

    #[async_trait]
    impl MetricsReader for Reader {
        async fn get_time_series(
            &self,
            metric: &str,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> ProviderResult<Vec<TimeSeries>> {
            assert_eq!(metric, CPU_UTILIZATION);
            assert!(end - start >= Duration::days(7));
            if self.fail {
                return Err(ProviderError::Auth("service account disabled".to_string()));
            }
            Ok(self.series.clone())
        }
    }

    struct FakeGcp {
        instances: Vec<ProviderInstance>,
        series: Vec<TimeSeries>,
        with_metrics: bool,
        fail_metrics: bool,
    }

    #[async_trait]
    impl ProviderClients for FakeGcp {
        fn provider(&self) -> CloudProvider {
            CloudProvider::Gcp
        }

        async fn sql_lister(
            &self,
            _credentials: &serde_json::Value,
        ) -> ProviderResult<Option<Box<dyn InstanceLister>>> {
            Ok(Some(Box::new(Lister(self.instances.clone()))))
        }

        async fn metrics_reader(
            &self,
            _credentials: &serde_json::Value,
        ) -> ProviderResult<Option<Box<dyn MetricsReader>>> {
            if !self.with_metrics {
                return Ok(None);
            }
            Ok(Some(Box::new(Reader {
                series: self.series.clone(),
                fail: self.fail_metrics,
            })))
        }
    }

    fn instance(name: &str) -> ProviderInstance {
        ProviderInstance {
            uid: format!("acme:{}", name),
            name: name.to_string(),
            resource_type: ResourceType::Sql,
            status: "RUNNING".to_string(),
            settings: serde_json::json!({}),
            region: "us-central1".to_string(),
        }
    }

    fn series(name: &str, values: &[f64]) -> TimeSeries {
        let now = Utc::now();
        TimeSeries {
            resource_name: name.to_string(),
            points: values
                .iter()
                .map(|&value| DataPoint { timestamp: now, value })
                .collect(),
        }
    }

    fn account(provider: CloudProvider) -> CloudAccount {
        CloudAccount {
            id: Uuid::now_v7(),
            provider,
            credentials: serde_json::json!({ "project_id": "acme" }),
        }
    }

    fn rule(gcp: FakeGcp) -> SqlInstancePeak {
        SqlInstancePeak::new(
            &AuditConfig::default(),
            Arc::new(ProviderRegistry::new().with(Arc::new(gcp))),
        )
    }

    #[tokio::test]
    async fn test_flags_instances_with_low_peak() {
        let rule = rule(FakeGcp {
            instances: vec![instance("idle-db"), instance("busy-db"), instance("new-db")],
            series: vec![
                series("idle-db", &[0.05, 0.21, 0.1]),
                series("busy-db", &[0.2, 0.93]),
                series("new-db", &[]),
            ],
            with_metrics: true,
            fail_metrics: false,
        });

        let items = rule.execute(&account(CloudProvider::Gcp)).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].resource_name, "idle-db");
        assert_eq!(items[0].region, "us-central1");
        assert_eq!(items[0].details["peak_cpu_utilization"], 0.21);
        assert_eq!(items[0].details["threshold"], 0.5);
        assert_eq!(items[0].details["lookback_days"], 7);
    }

    #[tokio::test]
    async fn test_peak_equal_to_threshold_is_not_flagged() {
        let rule = rule(FakeGcp {
            instances: vec![instance("edge-db")],
            series: vec![series("edge-db", &[0.5])],
            with_metrics: true,
            fail_metrics: false,
        });

        let items = rule.execute(&account(CloudProvider::Gcp)).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_provider_or_capability_yields_nothing() {
        let rule = rule(FakeGcp {
            instances: vec![instance("idle-db")],
            series: vec![series("idle-db", &[0.01])],
            with_metrics: false,
            fail_metrics: false,
        });

        assert!(rule.execute(&account(CloudProvider::Gcp)).await.unwrap().is_empty());
        assert!(rule.execute(&account(CloudProvider::Aws)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_metrics_failure_is_upstream_error() {
        let rule = rule(FakeGcp {
            instances: vec![instance("idle-db")],
            series: vec![],
            with_metrics: true,
            fail_metrics: true,
        });

        let result = rule.execute(&account(CloudProvider::Gcp)).await;
        assert!(matches!(result, Err(crate::error::AuditError::Upstream(_))));
    }
}
