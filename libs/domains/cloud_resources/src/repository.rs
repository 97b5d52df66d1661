use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{CloudResourceError, CloudResourceResult};
use crate::models::{
    CreateResourceGroup, DiscoveredResource, Resource, ResourceGroup, ResourceType,
    UpdateResourceGroup,
};

/// Persistence contract for the resource inventory.
///
/// # Ordering
///
/// `get_resources` must return resources sorted **ascending by `uid`**, where
/// ascending means byte-wise `str` ordering (`"Gamma" < "alpha"`), not a
/// locale collation. Reconciliation binary-searches that slice; an implementation that breaks
/// the order produces silently wrong matches instead of an error.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Insert a newly discovered resource, assigning its ID
    async fn insert_resource(&self, input: DiscoveredResource) -> CloudResourceResult<Resource>;

    /// Resources of an account, ascending by uid. An empty `types` slice means all types.
    async fn get_resources(
        &self,
        cloud_account_id: Uuid,
        types: &[ResourceType],
    ) -> CloudResourceResult<Vec<Resource>>;

    /// Overwrite the status label of a resource
    async fn update_status(&self, id: Uuid, status: &str) -> CloudResourceResult<()>;

    /// Delete a resource (hard delete)
    async fn remove_resource(&self, id: Uuid) -> CloudResourceResult<()>;

    async fn get_resource_by_id(&self, id: Uuid) -> CloudResourceResult<Option<Resource>>;
}

/// Persistence contract for resource groups
#[async_trait]
pub trait ResourceGroupStore: Send + Sync {
    /// Create a group; names are unique (case-insensitive) per account
    async fn create_group(&self, input: CreateResourceGroup) -> CloudResourceResult<ResourceGroup>;

    async fn get_group(&self, id: Uuid) -> CloudResourceResult<Option<ResourceGroup>>;

    async fn list_groups(&self, cloud_account_id: Uuid) -> CloudResourceResult<Vec<ResourceGroup>>;

    async fn update_group(
        &self,
        id: Uuid,
        input: UpdateResourceGroup,
    ) -> CloudResourceResult<ResourceGroup>;

    /// Delete a group, returning whether it existed
    async fn delete_group(&self, id: Uuid) -> CloudResourceResult<bool>;
}

/// In-memory implementation of both stores (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryResourceStore {
    resources: Arc<RwLock<HashMap<Uuid, Resource>>>,
    groups: Arc<RwLock<HashMap<Uuid, ResourceGroup>>>,
}

impl InMemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResourceStore for InMemoryResourceStore {
    async fn insert_resource(&self, input: DiscoveredResource) -> CloudResourceResult<Resource> {
        let mut resources = self.resources.write().await;

        let uid_taken = resources
            .values()
            .any(|r| r.cloud_account.id == input.cloud_account.id && r.uid == input.uid);
        if uid_taken {
            return Err(CloudResourceError::DuplicateUid(input.uid));
        }

        let resource = Resource::new(input);
        resources.insert(resource.id, resource.clone());

        Ok(resource)
    }

    async fn get_resources(
        &self,
        cloud_account_id: Uuid,
        types: &[ResourceType],
    ) -> CloudResourceResult<Vec<Resource>> {
        let resources = self.resources.read().await;

        let mut result: Vec<Resource> = resources
            .values()
            .filter(|r| r.cloud_account.id == cloud_account_id)
            .filter(|r| types.is_empty() || types.contains(&r.resource_type))
            .cloned()
            .collect();

        result.sort_by(|a, b| a.uid.cmp(&b.uid));

        Ok(result)
    }

    async fn update_status(&self, id: Uuid, status: &str) -> CloudResourceResult<()> {
        let mut resources = self.resources.write().await;

        let resource = resources
            .get_mut(&id)
            .ok_or(CloudResourceError::ResourceNotFound(id))?;
        resource.status = status.to_string();
        resource.updated_at = Utc::now();

        Ok(())
    }

    async fn remove_resource(&self, id: Uuid) -> CloudResourceResult<()> {
        let mut resources = self.resources.write().await;

        resources
            .remove(&id)
            .map(|_| ())
            .ok_or(CloudResourceError::ResourceNotFound(id))
    }

    async fn get_resource_by_id(&self, id: Uuid) -> CloudResourceResult<Option<Resource>> {
        let resources = self.resources.read().await;
        Ok(resources.get(&id).cloned())
    }
}

fn name_taken(
    groups: &HashMap<Uuid, ResourceGroup>,
    cloud_account_id: Uuid,
    name: &str,
    except: Option<Uuid>,
) -> bool {
    groups.values().any(|g| {
        g.cloud_account_id == cloud_account_id
            && Some(g.id) != except
            && g.name.to_lowercase() == name.to_lowercase()
    })
}

#[async_trait]
impl ResourceGroupStore for InMemoryResourceStore {
    async fn create_group(&self, input: CreateResourceGroup) -> CloudResourceResult<ResourceGroup> {
        let mut groups = self.groups.write().await;

        if name_taken(&groups, input.cloud_account_id, &input.name, None) {
            return Err(CloudResourceError::DuplicateName(input.name));
        }

        let group = ResourceGroup::new(input);
        groups.insert(group.id, group.clone());

        Ok(group)
    }

    async fn get_group(&self, id: Uuid) -> CloudResourceResult<Option<ResourceGroup>> {
        let groups = self.groups.read().await;
        Ok(groups.get(&id).cloned())
    }

    async fn list_groups(&self, cloud_account_id: Uuid) -> CloudResourceResult<Vec<ResourceGroup>> {
        let groups = self.groups.read().await;

        let mut result: Vec<ResourceGroup> = groups
            .values()
            .filter(|g| g.cloud_account_id == cloud_account_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(result)
    }

    async fn update_group(
        &self,
        id: Uuid,
        input: UpdateResourceGroup,
    ) -> CloudResourceResult<ResourceGroup> {
        let mut groups = self.groups.write().await;

        let account_id = groups
            .get(&id)
            .map(|g| g.cloud_account_id)
            .ok_or(CloudResourceError::GroupNotFound(id))?;

        if let Some(name) = &input.name {
            if name_taken(&groups, account_id, name, Some(id)) {
                return Err(CloudResourceError::DuplicateName(name.clone()));
            }
        }

        let group = groups
            .get_mut(&id)
            .ok_or(CloudResourceError::GroupNotFound(id))?;
        group.apply_update(input);

        Ok(group.clone())
    }

    async fn delete_group(&self, id: Uuid) -> CloudResourceResult<bool> {
        let mut groups = self.groups.write().await;
        Ok(groups.remove(&id).is_some())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CloudAccountRef, CloudProvider};
    use proptest::prelude::*;

    fn discovered(account: CloudAccountRef, uid: &str, resource_type: ResourceType) -> DiscoveredResource {
        DiscoveredResource {
            uid: uid.to_string(),
            name: format!("instance-{}", uid),
            resource_type,
            status: "RUNNING".to_string(),
            cloud_account: account,
            settings: serde_json::json!({}),
            region: "us-central1".to_string(),
        }
    }

    fn account() -> CloudAccountRef {
        CloudAccountRef {
            id: Uuid::now_v7(),
            provider: CloudProvider::Gcp,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_resource() {
        let store = InMemoryResourceStore::new();
        let account = account();

        let created = store
            .insert_resource(discovered(account, "db-1", ResourceType::Sql))
            .await
            .unwrap();

        let fetched = store.get_resource_by_id(created.id).await.unwrap();
        assert_eq!(fetched, Some(created));
    }

    #[tokio::test]
    async fn test_duplicate_uid_rejected_within_account_only() {
        let store = InMemoryResourceStore::new();
        let first = account();
        let second = account();

        store
            .insert_resource(discovered(first, "db-1", ResourceType::Sql))
            .await
            .unwrap();

        let result = store
            .insert_resource(discovered(first, "db-1", ResourceType::Sql))
            .await;
        assert!(matches!(result, Err(CloudResourceError::DuplicateUid(_))));

        store
            .insert_resource(discovered(second, "db-1", ResourceType::Sql))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_get_resources_filters_by_type() {
        let store = InMemoryResourceStore::new();
        let account = account();

        store
            .insert_resource(discovered(account, "vm-1", ResourceType::Compute))
            .await
            .unwrap();
        store
            .insert_resource(discovered(account, "db-1", ResourceType::Sql))
            .await
            .unwrap();

        let sql = store
            .get_resources(account.id, &[ResourceType::Sql])
            .await
            .unwrap();
        assert_eq!(sql.len(), 1);
        assert_eq!(sql[0].uid, "db-1");

        let all = store.get_resources(account.id, &[]).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_update_status_and_remove_missing_resource() {
        let store = InMemoryResourceStore::new();
        let missing = Uuid::now_v7();

        assert!(matches!(
            store.update_status(missing, "STOPPED").await,
            Err(CloudResourceError::ResourceNotFound(id)) if id == missing
        ));
        assert!(matches!(
            store.remove_resource(missing).await,
            Err(CloudResourceError::ResourceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_group_names_unique_per_account() {
        let store = InMemoryResourceStore::new();
        let account_id = Uuid::now_v7();

        let input = CreateResourceGroup {
            cloud_account_id: account_id,
            name: "Databases".to_string(),
            description: String::new(),
            resource_ids: vec![],
        };

        let group = store.create_group(input.clone()).await.unwrap();

        let duplicate = store
            .create_group(CreateResourceGroup {
                name: "databases".to_string(),
                ..input.clone()
            })
            .await;
        assert!(matches!(duplicate, Err(CloudResourceError::DuplicateName(_))));

        // Renaming a group to its own name is not a conflict
        let renamed = store
            .update_group(
                group.id,
                UpdateResourceGroup {
                    name: Some("DATABASES".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "DATABASES");

        assert!(store.delete_group(group.id).await.unwrap());
        assert!(!store.delete_group(group.id).await.unwrap());
    }

    proptest! {
        #[test]
        fn get_resources_is_strictly_ascending_by_uid(
            uids in proptest::collection::hash_set("[a-z0-9-]{1,12}", 0..40)
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let sorted = rt.block_on(async {
                let store = InMemoryResourceStore::new();
                let account = account();

                for uid in &uids {
                    store
                        .insert_resource(discovered(account, uid, ResourceType::Sql))
                        .await
                        .unwrap();
                }

                store.get_resources(account.id, &[]).await.unwrap()
            });

            prop_assert_eq!(sorted.len(), uids.len());
            prop_assert!(sorted.windows(2).all(|w| w[0].uid < w[1].uid));
        }
    }
}
