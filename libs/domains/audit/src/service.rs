use domain_cloud_resources::{CloudAccount, CredentialsResolver};
use observability::AuditMetrics;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::error::{AuditEntity, AuditError, Result};
use crate::models::{AuditResult, Item};
use crate::registry::RuleRegistry;
use crate::repository::ResultStore;
use crate::rule::AuditRule;

/// Audit Service - runs registered rules against cloud accounts and tracks their results
pub struct AuditService<S: ResultStore> {
    store: Arc<S>,
    registry: Arc<RuleRegistry>,
    resolver: Arc<dyn CredentialsResolver>,
}

impl<S: ResultStore> Clone for AuditService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            registry: Arc::clone(&self.registry),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<S: ResultStore> AuditService<S> {
    pub fn new(
        store: S,
        registry: Arc<RuleRegistry>,
        resolver: Arc<dyn CredentialsResolver>,
    ) -> Self {
        Self {
            store: Arc::new(store),
            registry,
            resolver,
        }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Run a single rule.
    ///
    /// The pending result is written before credentials are resolved. A
    /// failure to record the final data is returned to the caller.
    #[instrument(skip(self))]
    pub async fn run_by_id(&self, cloud_account_id: Uuid, rule_id: &str) -> Result<AuditResult> {
        let rule = self
            .registry
            .get(rule_id)
            .ok_or_else(|| AuditError::not_found(AuditEntity::Rule, rule_id))?;

        let pending = self.store.create_pending(rule.name(), cloud_account_id).await?;
        let account = self.resolver.get_credentials(cloud_account_id).await?;

        let items = execute(rule.as_ref(), &account).await?;
        let completed = pending.complete(items);

        if let Err(e) = self.store.update_result(&completed).await {
            AuditMetrics::record_result_write_failed(rule.name());
            return Err(e);
        }

        Ok(completed)
    }

    /// Run every rule of a category, in registration order
    #[instrument(skip(self))]
    pub async fn run_by_category(
        &self,
        cloud_account_id: Uuid,
        category: &str,
    ) -> Result<Vec<AuditResult>> {
        let rules = self
            .registry
            .category(category)
            .ok_or_else(|| AuditError::not_found(AuditEntity::Category, category))?;

        let account = self.resolver.get_credentials(cloud_account_id).await?;
        self.run_rules(&account, rules.iter()).await
    }

    /// Run every registered rule, in name order, grouping results by category
    #[instrument(skip(self))]
    pub async fn run_all(
        &self,
        cloud_account_id: Uuid,
    ) -> Result<BTreeMap<String, Vec<AuditResult>>> {
        let account = self.resolver.get_credentials(cloud_account_id).await?;
        let results = self.run_rules(&account, self.registry.rules()).await?;

        let mut grouped: BTreeMap<String, Vec<AuditResult>> = BTreeMap::new();
        for result in results {
            let category = self
                .registry
                .get(&result.rule_id)
                .map(|rule| rule.category().to_string())
                .unwrap_or_default();
            grouped.entry(category).or_default().push(result);
        }

        Ok(grouped)
    }

    /// Execute `rules` one after another.
    ///
    /// A rule execution failure aborts the run and leaves that rule's result
    /// pending. Failing to persist a result is logged and the run moves on.
    async fn run_rules<'a>(
        &self,
        account: &CloudAccount,
        rules: impl Iterator<Item = &'a Arc<dyn AuditRule>>,
    ) -> Result<Vec<AuditResult>> {
        let mut results = Vec::new();
        let mut skipped = Vec::new();

        for rule in rules {
            let pending = match self.store.create_pending(rule.name(), account.id).await {
                Ok(pending) => pending,
                Err(e) => {
                    error!(rule = rule.name(), error = %e, "Failed to record pending result, skipping rule");
                    AuditMetrics::record_result_write_failed(rule.name());
                    skipped.push(rule.name().to_string());
                    continue;
                }
            };

            let items = execute(rule.as_ref(), account).await?;
            let completed = pending.complete(items);

            if let Err(e) = self.store.update_result(&completed).await {
                error!(rule = rule.name(), result_id = %completed.id, error = %e, "Failed to record rule result");
                AuditMetrics::record_result_write_failed(rule.name());
            }

            results.push(completed);
        }

        if !skipped.is_empty() {
            warn!(
                account_id = %account.id,
                skipped = ?skipped,
                completed = results.len(),
                "Audit run skipped rules that could not be recorded"
            );
        }

        Ok(results)
    }

    /// Most recent result of a rule
    pub async fn get_result_by_id(
        &self,
        cloud_account_id: Uuid,
        rule_id: &str,
    ) -> Result<AuditResult> {
        self.store
            .get_last_run(cloud_account_id, rule_id)
            .await?
            .ok_or_else(|| AuditError::not_found(AuditEntity::Result, rule_id))
    }

    /// Latest result of every rule, grouped by category.
    ///
    /// Every category is present; rules that never ran are left out of its list.
    pub async fn get_result_by_category(
        &self,
        cloud_account_id: Uuid,
    ) -> Result<BTreeMap<String, Vec<AuditResult>>> {
        let mut grouped = BTreeMap::new();

        for (category, rules) in self.registry.categories() {
            let mut results = Vec::new();
            for rule in rules {
                if let Some(last) = self.store.get_last_run(cloud_account_id, rule.name()).await? {
                    results.push(last);
                }
            }
            grouped.insert(category.to_string(), results);
        }

        Ok(grouped)
    }

    /// Latest result of every rule that has run, in rule-name order
    pub async fn get_result_by_all(&self, cloud_account_id: Uuid) -> Result<Vec<AuditResult>> {
        let mut results = Vec::new();

        for rule in self.registry.rules() {
            if let Some(last) = self.store.get_last_run(cloud_account_id, rule.name()).await? {
                results.push(last);
            }
        }

        Ok(results)
    }
}

async fn execute(rule: &dyn AuditRule, account: &CloudAccount) -> Result<Vec<Item>> {
    let started = Instant::now();

    match rule.execute(account).await {
        Ok(items) => {
            AuditMetrics::record_rule_completed(
                rule.name(),
                rule.category(),
                items.len(),
                started.elapsed().as_secs_f64(),
            );
            info!(rule = rule.name(), account_id = %account.id, findings = items.len(), "Audit rule completed");
            Ok(items)
        }
        Err(e) => {
            AuditMetrics::record_rule_failed(rule.name(), rule.category());
            error!(rule = rule.name(), account_id = %account.id, error = %e, "Audit rule failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryResultStore, MockResultStore};
    use async_trait::async_trait;
    use domain_cloud_resources::{CloudProvider, CloudResourceError, CloudResourceResult};
    use mockall::mock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    mock! {
        Resolver {}

        #[async_trait]
        impl CredentialsResolver for Resolver {
            async fn get_credentials(&self, account_id: Uuid) -> CloudResourceResult<CloudAccount>;
            async fn list_accounts(&self) -> CloudResourceResult<Vec<CloudAccount>>;
        }
    }

    /// Rule that counts its executions and optionally fails
    struct CountingRule {
        category: &'static str,
        name: &'static str,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl CountingRule {
        fn new(category: &'static str, name: &'static str, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                category,
                name,
                fail,
                calls: Arc::new(AtomicUsize::new(0)),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AuditRule for CountingRule {
        fn category(&self) -> &str {
            self.category
        }

        fn name(&self) -> &str {
            self.name
        }

        async fn execute(&self, _account: &CloudAccount) -> Result<Vec<Item>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AuditError::Upstream("monitoring API unavailable".to_string()));
            }
            Ok(vec![Item {
                resource_name: format!("{}-finding", self.name),
                region: "us-central1".to_string(),
                details: serde_json::json!({}),
            }])
        }
    }

    fn resolver() -> MockResolver {
        let mut resolver = MockResolver::new();
        resolver.expect_get_credentials().returning(|id| {
            Ok(CloudAccount {
                id,
                provider: CloudProvider::Gcp,
                credentials: serde_json::json!({}),
            })
        });
        resolver
    }

    fn registry(rules: Vec<Arc<dyn AuditRule>>) -> Arc<RuleRegistry> {
        Arc::new(RuleRegistry::new(rules).unwrap())
    }

    #[tokio::test]
    async fn test_run_by_id_unknown_rule_writes_nothing() {
        let mut store = MockResultStore::new();
        store.expect_create_pending().never();
        store.expect_update_result().never();

        let mut resolver = MockResolver::new();
        resolver.expect_get_credentials().never();

        let service = AuditService::new(
            store,
            registry(vec![CountingRule::new("overprovision", "sql_instance_peak", false)]),
            Arc::new(resolver),
        );

        let result = service.run_by_id(Uuid::now_v7(), "does-not-exist").await;

        assert!(matches!(
            result,
            Err(AuditError::NotFound { entity: AuditEntity::Rule, ref value }) if value == "does-not-exist"
        ));
    }

    #[tokio::test]
    async fn test_run_by_id_completes_result() {
        let rule = CountingRule::new("overprovision", "sql_instance_peak", false);
        let store = InMemoryResultStore::new();
        let service = AuditService::new(
            store.clone(),
            registry(vec![rule.clone()]),
            Arc::new(resolver()),
        );
        let account_id = Uuid::now_v7();

        let result = service.run_by_id(account_id, "sql_instance_peak").await.unwrap();

        assert!(!result.is_pending());
        assert_eq!(result.items().len(), 1);
        assert_eq!(rule.calls(), 1);

        let stored = service
            .get_result_by_id(account_id, "sql_instance_peak")
            .await
            .unwrap();
        assert_eq!(stored, result);
    }

    #[tokio::test]
    async fn test_run_by_id_surfaces_update_failure() {
        let account_id = Uuid::now_v7();
        let mut store = MockResultStore::new();
        store
            .expect_create_pending()
            .times(1)
            .returning(|rule_id, account_id| Ok(AuditResult::pending(rule_id, account_id)));
        store
            .expect_update_result()
            .times(1)
            .returning(|_| Err(AuditError::Database("deadlock detected".to_string())));

        let service = AuditService::new(
            store,
            registry(vec![CountingRule::new("overprovision", "sql_instance_peak", false)]),
            Arc::new(resolver()),
        );

        let result = service.run_by_id(account_id, "sql_instance_peak").await;
        assert!(matches!(result, Err(AuditError::Database(_))));
    }

    #[tokio::test]
    async fn test_run_by_id_credentials_failure_leaves_pending() {
        let store = InMemoryResultStore::new();
        let mut resolver = MockResolver::new();
        resolver
            .expect_get_credentials()
            .returning(|id| Err(CloudResourceError::AccountNotFound(id)));

        let rule = CountingRule::new("overprovision", "sql_instance_peak", false);
        let service = AuditService::new(store.clone(), registry(vec![rule.clone()]), Arc::new(resolver));
        let account_id = Uuid::now_v7();

        let result = service.run_by_id(account_id, "sql_instance_peak").await;

        assert!(matches!(result, Err(AuditError::Upstream(_))));
        assert_eq!(rule.calls(), 0);
        let last = store
            .get_last_run(account_id, "sql_instance_peak")
            .await
            .unwrap()
            .unwrap();
        assert!(last.is_pending());
    }

    #[tokio::test]
    async fn test_run_by_category_unknown_category_checked_first() {
        let mut resolver = MockResolver::new();
        resolver.expect_get_credentials().never();

        let service = AuditService::new(
            InMemoryResultStore::new(),
            registry(vec![CountingRule::new("overprovision", "sql_instance_peak", false)]),
            Arc::new(resolver),
        );

        let result = service.run_by_category(Uuid::now_v7(), "security").await;
        assert!(matches!(
            result,
            Err(AuditError::NotFound { entity: AuditEntity::Category, .. })
        ));
    }

    #[tokio::test]
    async fn test_run_by_category_second_failure_aborts() {
        let first = CountingRule::new("overprovision", "first", false);
        let second = CountingRule::new("overprovision", "second", true);
        let third = CountingRule::new("overprovision", "third", false);

        let store = InMemoryResultStore::new();
        let service = AuditService::new(
            store.clone(),
            registry(vec![first.clone(), second.clone(), third.clone()]),
            Arc::new(resolver()),
        );
        let account_id = Uuid::now_v7();

        let result = service.run_by_category(account_id, "overprovision").await;

        assert!(matches!(result, Err(AuditError::Upstream(_))));
        assert_eq!(third.calls(), 0);

        let stored = store.results_for(account_id).await;
        assert_eq!(stored.len(), 2);
        assert_eq!(stored.iter().filter(|r| r.is_pending()).count(), 1);
        assert_eq!(stored.iter().filter(|r| !r.is_pending()).count(), 1);

        let pending = stored.iter().find(|r| r.is_pending()).unwrap();
        assert_eq!(pending.rule_id, "second");
    }

    #[tokio::test]
    async fn test_run_by_category_continues_after_update_failure() {
        let mut store = MockResultStore::new();
        store
            .expect_create_pending()
            .times(2)
            .returning(|rule_id, account_id| Ok(AuditResult::pending(rule_id, account_id)));
        store
            .expect_update_result()
            .times(2)
            .returning(|_| Err(AuditError::Database("disk full".to_string())));

        let first = CountingRule::new("overprovision", "first", false);
        let second = CountingRule::new("overprovision", "second", false);
        let service = AuditService::new(
            store,
            registry(vec![first.clone(), second.clone()]),
            Arc::new(resolver()),
        );

        let results = service
            .run_by_category(Uuid::now_v7(), "overprovision")
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(second.calls(), 1);
    }

    #[tokio::test]
    async fn test_run_by_category_skips_rule_without_pending_result() {
        let mut store = MockResultStore::new();
        store
            .expect_create_pending()
            .times(2)
            .returning(|rule_id, account_id| {
                if rule_id == "first" {
                    Err(AuditError::Database("connection reset".to_string()))
                } else {
                    Ok(AuditResult::pending(rule_id, account_id))
                }
            });
        store.expect_update_result().times(1).returning(|_| Ok(()));

        let first = CountingRule::new("overprovision", "first", false);
        let second = CountingRule::new("overprovision", "second", false);
        let service = AuditService::new(
            store,
            registry(vec![first.clone(), second.clone()]),
            Arc::new(resolver()),
        );

        let results = service
            .run_by_category(Uuid::now_v7(), "overprovision")
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].rule_id, "second");
        assert_eq!(first.calls(), 0);
        assert_eq!(second.calls(), 1);
    }

    #[tokio::test]
    async fn test_run_all_groups_by_category_in_name_order() {
        let service = AuditService::new(
            InMemoryResultStore::new(),
            registry(vec![
                CountingRule::new("security", "public_buckets", false),
                CountingRule::new("overprovision", "sql_instance_peak", false),
                CountingRule::new("overprovision", "compute_idle", false),
            ]),
            Arc::new(resolver()),
        );

        let grouped = service.run_all(Uuid::now_v7()).await.unwrap();

        let overprovision: Vec<&str> = grouped["overprovision"]
            .iter()
            .map(|r| r.rule_id.as_str())
            .collect();
        assert_eq!(overprovision, vec!["compute_idle", "sql_instance_peak"]);
        assert_eq!(grouped["security"].len(), 1);
    }

    #[tokio::test]
    async fn test_get_results_omit_rules_that_never_ran() {
        let service = AuditService::new(
            InMemoryResultStore::new(),
            registry(vec![
                CountingRule::new("security", "public_buckets", false),
                CountingRule::new("overprovision", "sql_instance_peak", false),
            ]),
            Arc::new(resolver()),
        );
        let account_id = Uuid::now_v7();

        let missing = service.get_result_by_id(account_id, "sql_instance_peak").await;
        assert!(matches!(
            missing,
            Err(AuditError::NotFound { entity: AuditEntity::Result, .. })
        ));

        service.run_by_id(account_id, "sql_instance_peak").await.unwrap();

        let by_category = service.get_result_by_category(account_id).await.unwrap();
        assert_eq!(by_category["overprovision"].len(), 1);
        assert!(by_category["security"].is_empty());

        let all = service.get_result_by_all(account_id).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].rule_id, "sql_instance_peak");
    }
}
