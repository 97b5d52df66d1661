use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::{audit_results, AuditResultsEntity};
use crate::error::{AuditEntity, AuditError, Result};
use crate::models::AuditResult;
use crate::repository::ResultStore;

/// PostgreSQL implementation of ResultStore
#[derive(Clone)]
pub struct PgResultStore {
    db: DatabaseConnection,
}

impl PgResultStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ResultStore for PgResultStore {
    async fn create_pending(&self, rule_id: &str, cloud_account_id: Uuid) -> Result<AuditResult> {
        let pending = AuditResult::pending(rule_id, cloud_account_id);

        let model = audit_results::ActiveModel {
            id: Set(pending.id),
            rule_id: Set(pending.rule_id.clone()),
            cloud_account_id: Set(pending.cloud_account_id),
            result: Set(None),
            evaluated_at: Set(pending.evaluated_at.into()),
        };

        model.insert(&self.db).await?.try_into()
    }

    async fn update_result(&self, result: &AuditResult) -> Result<()> {
        let data = result
            .result
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        let outcome = AuditResultsEntity::update_many()
            .col_expr(audit_results::Column::Result, Expr::value(data))
            .filter(audit_results::Column::Id.eq(result.id))
            .exec(&self.db)
            .await?;

        if outcome.rows_affected == 0 {
            return Err(AuditError::not_found(AuditEntity::Result, result.id.to_string()));
        }
        Ok(())
    }

    async fn get_last_run(
        &self,
        cloud_account_id: Uuid,
        rule_id: &str,
    ) -> Result<Option<AuditResult>> {
        AuditResultsEntity::find()
            .filter(audit_results::Column::CloudAccountId.eq(cloud_account_id))
            .filter(audit_results::Column::RuleId.eq(rule_id))
            .order_by_desc(audit_results::Column::EvaluatedAt)
            .order_by_desc(audit_results::Column::Id)
            .one(&self.db)
            .await?
            .map(AuditResult::try_from)
            .transpose()
    }
}
