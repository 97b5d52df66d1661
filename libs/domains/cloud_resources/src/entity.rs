use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};

use crate::error::CloudResourceError;

// ===== Resources Entity =====

pub mod resources {
    use super::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "resources")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        #[sea_orm(column_type = "String(StringLen::N(255))")]
        pub uid: String,
        #[sea_orm(column_type = "String(StringLen::N(255))")]
        pub name: String,
        #[sea_orm(column_type = "String(StringLen::N(50))")]
        pub resource_type: String,
        #[sea_orm(column_type = "String(StringLen::N(50))")]
        pub status: String,
        pub cloud_account_id: Uuid,
        #[sea_orm(column_type = "String(StringLen::N(20))")]
        pub provider: String,
        #[sea_orm(column_type = "JsonBinary")]
        pub settings: serde_json::Value,
        #[sea_orm(column_type = "String(StringLen::N(100))")]
        pub region: String,
        pub created_at: DateTimeWithTimeZone,
        pub updated_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl TryFrom<Model> for crate::models::Resource {
        type Error = CloudResourceError;

        fn try_from(model: Model) -> Result<Self, Self::Error> {
            let resource_type = model.resource_type.parse().map_err(|_| {
                CloudResourceError::Database(format!(
                    "invalid resource_type '{}' on resource {}",
                    model.resource_type, model.id
                ))
            })?;
            let provider = model.provider.parse().map_err(|_| {
                CloudResourceError::Database(format!(
                    "invalid provider '{}' on resource {}",
                    model.provider, model.id
                ))
            })?;

            Ok(Self {
                id: model.id,
                uid: model.uid,
                name: model.name,
                resource_type,
                status: model.status,
                cloud_account: crate::models::CloudAccountRef {
                    id: model.cloud_account_id,
                    provider,
                },
                settings: model.settings,
                region: model.region,
                created_at: model.created_at.into(),
                updated_at: model.updated_at.into(),
            })
        }
    }

    impl From<crate::models::DiscoveredResource> for ActiveModel {
        fn from(input: crate::models::DiscoveredResource) -> Self {
            let now = chrono::Utc::now();
            ActiveModel {
                id: Set(Uuid::now_v7()),
                uid: Set(input.uid),
                name: Set(input.name),
                resource_type: Set(input.resource_type.to_string()),
                status: Set(input.status),
                cloud_account_id: Set(input.cloud_account.id),
                provider: Set(input.cloud_account.provider.to_string()),
                settings: Set(input.settings),
                region: Set(input.region),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            }
        }
    }
}

// ===== Resource Groups Entity =====

pub mod resource_groups {
    use super::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "resource_groups")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub cloud_account_id: Uuid,
        #[sea_orm(column_type = "String(StringLen::N(255))")]
        pub name: String,
        #[sea_orm(column_type = "Text")]
        pub description: String,
        /// Member resource IDs as a JSON array
        #[sea_orm(column_type = "JsonBinary")]
        pub resource_ids: serde_json::Value,
        pub created_at: DateTimeWithTimeZone,
        pub updated_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for crate::models::ResourceGroup {
        fn from(model: Model) -> Self {
            Self {
                id: model.id,
                cloud_account_id: model.cloud_account_id,
                name: model.name,
                description: model.description,
                resource_ids: serde_json::from_value(model.resource_ids).unwrap_or_default(),
                created_at: model.created_at.into(),
                updated_at: model.updated_at.into(),
            }
        }
    }

    impl From<crate::models::CreateResourceGroup> for ActiveModel {
        fn from(input: crate::models::CreateResourceGroup) -> Self {
            let now = chrono::Utc::now();
            ActiveModel {
                id: Set(Uuid::now_v7()),
                cloud_account_id: Set(input.cloud_account_id),
                name: Set(input.name),
                description: Set(input.description),
                resource_ids: Set(serde_json::json!(input.resource_ids)),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            }
        }
    }
}

// Re-export entities
pub use resource_groups::Entity as ResourceGroupsEntity;
pub use resources::Entity as ResourcesEntity;
