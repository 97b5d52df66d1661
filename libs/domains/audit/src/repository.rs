//! Audit result store trait

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AuditEntity, AuditError, Result};
use crate::models::AuditResult;

/// Persistence contract for audit results
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persist a pending result for a rule run that is about to start
    async fn create_pending(&self, rule_id: &str, cloud_account_id: Uuid) -> Result<AuditResult>;

    /// Overwrite the stored data of an existing result
    async fn update_result(&self, result: &AuditResult) -> Result<()>;

    /// Most recent result of a rule for an account, pending or not
    async fn get_last_run(&self, cloud_account_id: Uuid, rule_id: &str)
    -> Result<Option<AuditResult>>;
}

/// In-memory result store (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryResultStore {
    results: Arc<RwLock<HashMap<Uuid, AuditResult>>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored result of an account, oldest first
    pub async fn results_for(&self, cloud_account_id: Uuid) -> Vec<AuditResult> {
        let results = self.results.read().await;

        let mut found: Vec<AuditResult> = results
            .values()
            .filter(|r| r.cloud_account_id == cloud_account_id)
            .cloned()
            .collect();
        found.sort_by_key(|r| (r.evaluated_at, r.id));
        found
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn create_pending(&self, rule_id: &str, cloud_account_id: Uuid) -> Result<AuditResult> {
        let pending = AuditResult::pending(rule_id, cloud_account_id);

        let mut results = self.results.write().await;
        results.insert(pending.id, pending.clone());

        Ok(pending)
    }

    async fn update_result(&self, result: &AuditResult) -> Result<()> {
        let mut results = self.results.write().await;

        let stored = results
            .get_mut(&result.id)
            .ok_or_else(|| AuditError::not_found(AuditEntity::Result, result.id.to_string()))?;
        stored.result = result.result.clone();

        Ok(())
    }

    async fn get_last_run(
        &self,
        cloud_account_id: Uuid,
        rule_id: &str,
    ) -> Result<Option<AuditResult>> {
        let results = self.results.read().await;

        Ok(results
            .values()
            .filter(|r| r.cloud_account_id == cloud_account_id && r.rule_id == rule_id)
            .max_by_key(|r| (r.evaluated_at, r.id))
            .cloned())
    }
}
