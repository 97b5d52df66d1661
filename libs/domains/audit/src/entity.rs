use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::AuditError;

// ===== Audit Results Entity =====

pub mod audit_results {
    use super::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "audit_results")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        #[sea_orm(column_type = "String(StringLen::N(255))")]
        pub rule_id: String,
        pub cloud_account_id: Uuid,
        /// NULL while the run is pending
        #[sea_orm(column_type = "JsonBinary", nullable)]
        pub result: Option<serde_json::Value>,
        pub evaluated_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl TryFrom<Model> for crate::models::AuditResult {
        type Error = AuditError;

        fn try_from(model: Model) -> Result<Self, Self::Error> {
            let result = model.result.map(serde_json::from_value).transpose()?;

            Ok(Self {
                id: model.id,
                rule_id: model.rule_id,
                cloud_account_id: model.cloud_account_id,
                result,
                evaluated_at: model.evaluated_at.into(),
            })
        }
    }
}

pub use audit_results::Entity as AuditResultsEntity;
