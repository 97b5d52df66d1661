use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Order};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::{resource_groups, resources, ResourceGroupsEntity, ResourcesEntity};
use crate::error::{CloudResourceError, CloudResourceResult};
use crate::models::{
    CreateResourceGroup, DiscoveredResource, Resource, ResourceGroup, ResourceType,
    UpdateResourceGroup,
};
use crate::repository::{ResourceGroupStore, ResourceStore};

/// Orders by uid bytes regardless of the database collation, matching `str` ordering
const UID_BYTE_ORDER: &str = r#""uid" COLLATE "C""#;

/// PostgreSQL implementation of the resource and group stores
#[derive(Clone)]
pub struct PgResourceStore {
    db: DatabaseConnection,
}

impl PgResourceStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn name_taken(
        &self,
        cloud_account_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> CloudResourceResult<bool> {
        let name = name.to_lowercase();
        let taken = ResourceGroupsEntity::find()
            .filter(resource_groups::Column::CloudAccountId.eq(cloud_account_id))
            .all(&self.db)
            .await?
            .into_iter()
            .any(|g| Some(g.id) != except && g.name.to_lowercase() == name);
        Ok(taken)
    }
}

#[async_trait]
impl ResourceStore for PgResourceStore {
    async fn insert_resource(&self, input: DiscoveredResource) -> CloudResourceResult<Resource> {
        let existing = ResourcesEntity::find()
            .filter(resources::Column::CloudAccountId.eq(input.cloud_account.id))
            .filter(resources::Column::Uid.eq(input.uid.as_str()))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(CloudResourceError::DuplicateUid(input.uid));
        }

        let model: resources::ActiveModel = input.into();
        model.insert(&self.db).await?.try_into()
    }

    async fn get_resources(
        &self,
        cloud_account_id: Uuid,
        types: &[ResourceType],
    ) -> CloudResourceResult<Vec<Resource>> {
        let mut query =
            ResourcesEntity::find().filter(resources::Column::CloudAccountId.eq(cloud_account_id));

        if !types.is_empty() {
            query = query.filter(
                resources::Column::ResourceType.is_in(types.iter().map(|t| t.to_string())),
            );
        }

        query
            .order_by(Expr::cust(UID_BYTE_ORDER), Order::Asc)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Resource::try_from)
            .collect()
    }

    async fn update_status(&self, id: Uuid, status: &str) -> CloudResourceResult<()> {
        let now: chrono::DateTime<chrono::FixedOffset> = chrono::Utc::now().into();
        let result = ResourcesEntity::update_many()
            .col_expr(resources::Column::Status, Expr::value(status.to_string()))
            .col_expr(resources::Column::UpdatedAt, Expr::value(now))
            .filter(resources::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(CloudResourceError::ResourceNotFound(id));
        }
        Ok(())
    }

    async fn remove_resource(&self, id: Uuid) -> CloudResourceResult<()> {
        let result = ResourcesEntity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(CloudResourceError::ResourceNotFound(id));
        }
        Ok(())
    }

    async fn get_resource_by_id(&self, id: Uuid) -> CloudResourceResult<Option<Resource>> {
        ResourcesEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Resource::try_from)
            .transpose()
    }
}

#[async_trait]
impl ResourceGroupStore for PgResourceStore {
    async fn create_group(&self, input: CreateResourceGroup) -> CloudResourceResult<ResourceGroup> {
        if self
            .name_taken(input.cloud_account_id, &input.name, None)
            .await?
        {
            return Err(CloudResourceError::DuplicateName(input.name));
        }

        let model: resource_groups::ActiveModel = input.into();
        let result = model.insert(&self.db).await?.into();
        Ok(result)
    }

    async fn get_group(&self, id: Uuid) -> CloudResourceResult<Option<ResourceGroup>> {
        let result = ResourceGroupsEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Into::into);
        Ok(result)
    }

    async fn list_groups(&self, cloud_account_id: Uuid) -> CloudResourceResult<Vec<ResourceGroup>> {
        let results = ResourceGroupsEntity::find()
            .filter(resource_groups::Column::CloudAccountId.eq(cloud_account_id))
            .order_by_asc(resource_groups::Column::Name)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        Ok(results)
    }

    async fn update_group(
        &self,
        id: Uuid,
        input: UpdateResourceGroup,
    ) -> CloudResourceResult<ResourceGroup> {
        let existing = ResourceGroupsEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(CloudResourceError::GroupNotFound(id))?;

        if let Some(name) = &input.name {
            if self
                .name_taken(existing.cloud_account_id, name, Some(id))
                .await?
            {
                return Err(CloudResourceError::DuplicateName(name.clone()));
            }
        }

        let mut model: resource_groups::ActiveModel = existing.into();
        if let Some(name) = input.name {
            model.name = Set(name);
        }
        if let Some(description) = input.description {
            model.description = Set(description);
        }
        if let Some(resource_ids) = input.resource_ids {
            model.resource_ids = Set(serde_json::json!(resource_ids));
        }
        model.updated_at = Set(chrono::Utc::now().into());

        let result = model.update(&self.db).await?.into();
        Ok(result)
    }

    async fn delete_group(&self, id: Uuid) -> CloudResourceResult<bool> {
        let result = ResourceGroupsEntity::delete_by_id(id)
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
