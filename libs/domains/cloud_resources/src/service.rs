use observability::ResourceMetrics;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{CloudResourceError, CloudResourceResult},
    fetch::ResourceFetcher,
    models::{
        CloudAccount, CreateResourceGroup, Resource, ResourceDetails, ResourceGroup,
        ResourceState, ResourceType, SyncSummary, UpdateResourceGroup,
    },
    providers::{CredentialsResolver, ProviderRegistry},
    reconcile::reconcile,
    repository::{ResourceGroupStore, ResourceStore},
};

/// Resource Service - inventory sync, state changes and resource groups
pub struct ResourceService<S>
where
    S: ResourceStore + ResourceGroupStore,
{
    store: Arc<S>,
    resolver: Arc<dyn CredentialsResolver>,
    fetcher: ResourceFetcher,
}

impl<S> Clone for ResourceService<S>
where
    S: ResourceStore + ResourceGroupStore,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            resolver: Arc::clone(&self.resolver),
            fetcher: self.fetcher.clone(),
        }
    }
}

impl<S> ResourceService<S>
where
    S: ResourceStore + ResourceGroupStore,
{
    pub fn new(
        store: S,
        resolver: Arc<dyn CredentialsResolver>,
        providers: Arc<ProviderRegistry>,
    ) -> Self {
        Self {
            store: Arc::new(store),
            resolver,
            fetcher: ResourceFetcher::new(providers),
        }
    }

    /// Fetch the account's resources from its provider and reconcile the inventory
    #[instrument(skip(self))]
    pub async fn sync_resources(&self, account_id: Uuid) -> CloudResourceResult<Vec<Resource>> {
        let account = self.resolver.get_credentials(account_id).await?;
        self.sync_account(&account).await
    }

    /// Stored resources of an account, ascending by uid. Empty `types` means all.
    pub async fn get_all(
        &self,
        account_id: Uuid,
        types: &[ResourceType],
    ) -> CloudResourceResult<Vec<Resource>> {
        self.store.get_resources(account_id, types).await
    }

    /// Sync every registered account, one after another.
    ///
    /// A failing account is logged and counted; it does not stop the others.
    #[instrument(skip(self))]
    pub async fn sync_all_accounts(&self) -> CloudResourceResult<SyncSummary> {
        let accounts = self.resolver.list_accounts().await?;
        let mut summary = SyncSummary::default();

        for account in &accounts {
            match self.sync_account(account).await {
                Ok(resources) => {
                    summary.accounts_synced += 1;
                    summary.resources += resources.len();
                }
                Err(e) => {
                    error!(account_id = %account.id, error = %e, "Failed to sync cloud account");
                    summary.accounts_failed += 1;
                }
            }
        }

        info!(
            accounts_synced = summary.accounts_synced,
            accounts_failed = summary.accounts_failed,
            resources = summary.resources,
            "Finished syncing all cloud accounts"
        );
        Ok(summary)
    }

    async fn sync_account(&self, account: &CloudAccount) -> CloudResourceResult<Vec<Resource>> {
        let provider = account.provider.to_string();
        let started = Instant::now();
        ResourceMetrics::record_sync_started(&provider);

        let result = self.fetch_and_reconcile(account).await;

        match &result {
            Ok(resources) => {
                ResourceMetrics::record_sync_completed(
                    &provider,
                    resources.len(),
                    started.elapsed().as_secs_f64(),
                );
                info!(account_id = %account.id, resources = resources.len(), "Synced cloud account");
            }
            Err(e) => {
                ResourceMetrics::record_sync_failed(&provider, &e.to_string());
            }
        }

        result
    }

    async fn fetch_and_reconcile(
        &self,
        account: &CloudAccount,
    ) -> CloudResourceResult<Vec<Resource>> {
        let fetched = self.fetcher.fetch_all(account).await?;
        let inventory = reconcile(self.store.as_ref(), account.account_ref(), fetched).await?;
        self.prune_groups(account.id, &inventory).await;
        Ok(inventory)
    }

    /// Drop group members that are no longer in the account's inventory.
    ///
    /// Failures are logged; the next sync retries.
    async fn prune_groups(&self, account_id: Uuid, inventory: &[Resource]) {
        let groups = match self.store.list_groups(account_id).await {
            Ok(groups) => groups,
            Err(e) => {
                warn!(account_id = %account_id, error = %e, "Failed to load resource groups for pruning");
                return;
            }
        };

        let live: HashSet<Uuid> = inventory.iter().map(|r| r.id).collect();

        for group in groups {
            let kept: Vec<Uuid> = group
                .resource_ids
                .iter()
                .copied()
                .filter(|id| live.contains(id))
                .collect();
            if kept.len() == group.resource_ids.len() {
                continue;
            }

            let dropped = group.resource_ids.len() - kept.len();
            let update = UpdateResourceGroup {
                resource_ids: Some(kept),
                ..Default::default()
            };
            match self.store.update_group(group.id, update).await {
                Ok(_) => {
                    info!(group_id = %group.id, dropped, "Pruned removed resources from group");
                }
                Err(e) => {
                    warn!(group_id = %group.id, error = %e, "Failed to prune resource group");
                }
            }
        }
    }

    /// Drive a resource to the state in `details`.
    ///
    /// A resource already in the target status is left alone without calling
    /// the provider. When the provider call succeeds but the status write
    /// fails, the failure is logged and the call still succeeds.
    #[instrument(skip(self), fields(resource_id = %details.id, state = %details.state))]
    pub async fn change_state(&self, details: ResourceDetails) -> CloudResourceResult<()> {
        let resource = self
            .store
            .get_resource_by_id(details.id)
            .await?
            .filter(|r| r.cloud_account.id == details.cloud_account_id)
            .ok_or(CloudResourceError::ResourceNotFound(details.id))?;

        let target_status = details.state.target_status();
        if resource.status == target_status {
            info!(status = %resource.status, "Resource already in requested state");
            return Ok(());
        }

        if details.resource_type != ResourceType::Sql {
            return Err(CloudResourceError::InvalidParameter(format!(
                "state changes are not supported for resource type {}",
                details.resource_type
            )));
        }

        let account = self.resolver.get_credentials(details.cloud_account_id).await?;
        let provider = account.provider.to_string();

        let clients = self.fetcher.providers().get(account.provider).ok_or_else(|| {
            CloudResourceError::InvalidParameter(format!("unsupported provider {}", provider))
        })?;
        let idler = clients.sql_idler(&account.credentials).await?.ok_or_else(|| {
            CloudResourceError::InvalidParameter(format!(
                "provider {} cannot start or stop SQL instances",
                provider
            ))
        })?;

        let instance = resource.instance_ref();
        let outcome = match details.state {
            ResourceState::Start => idler.start_instance(&instance).await,
            ResourceState::Suspend => idler.stop_instance(&instance).await,
        };

        if let Err(e) = outcome {
            ResourceMetrics::record_state_change(&provider, target_status, false);
            return Err(e.into());
        }
        ResourceMetrics::record_state_change(&provider, target_status, true);

        if let Err(e) = self.store.update_status(resource.id, target_status).await {
            error!(
                error = %e,
                status = target_status,
                "Provider state changed but the stored status could not be updated"
            );
        }

        info!(status = target_status, "Changed resource state");
        Ok(())
    }

    // ===== Resource groups =====

    pub async fn list_groups(&self, account_id: Uuid) -> CloudResourceResult<Vec<ResourceGroup>> {
        self.store.list_groups(account_id).await
    }

    pub async fn get_group(
        &self,
        account_id: Uuid,
        group_id: Uuid,
    ) -> CloudResourceResult<ResourceGroup> {
        self.store
            .get_group(group_id)
            .await?
            .filter(|g| g.cloud_account_id == account_id)
            .ok_or(CloudResourceError::GroupNotFound(group_id))
    }

    /// Create a resource group with validation
    pub async fn create_group(
        &self,
        input: CreateResourceGroup,
    ) -> CloudResourceResult<ResourceGroup> {
        input
            .validate()
            .map_err(|e| CloudResourceError::InvalidParameter(e.to_string()))?;
        self.ensure_resources_belong(input.cloud_account_id, &input.resource_ids)
            .await?;

        let group = self.store.create_group(input).await?;

        info!(group_id = %group.id, account_id = %group.cloud_account_id, "Created resource group");
        Ok(group)
    }

    pub async fn update_group(
        &self,
        account_id: Uuid,
        group_id: Uuid,
        input: UpdateResourceGroup,
    ) -> CloudResourceResult<ResourceGroup> {
        input
            .validate()
            .map_err(|e| CloudResourceError::InvalidParameter(e.to_string()))?;

        // Ownership check before touching anything
        self.get_group(account_id, group_id).await?;

        if let Some(resource_ids) = &input.resource_ids {
            self.ensure_resources_belong(account_id, resource_ids).await?;
        }

        let group = self.store.update_group(group_id, input).await?;

        info!(group_id = %group_id, "Updated resource group");
        Ok(group)
    }

    pub async fn delete_group(&self, account_id: Uuid, group_id: Uuid) -> CloudResourceResult<()> {
        self.get_group(account_id, group_id).await?;

        if !self.store.delete_group(group_id).await? {
            return Err(CloudResourceError::GroupNotFound(group_id));
        }

        info!(group_id = %group_id, "Deleted resource group");
        Ok(())
    }

    async fn ensure_resources_belong(
        &self,
        account_id: Uuid,
        resource_ids: &[Uuid],
    ) -> CloudResourceResult<()> {
        if resource_ids.is_empty() {
            return Ok(());
        }

        let owned: HashSet<Uuid> = self
            .store
            .get_resources(account_id, &[])
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();

        if let Some(foreign) = resource_ids.iter().find(|id| !owned.contains(id)) {
            warn!(account_id = %account_id, resource_id = %foreign, "Group references a foreign resource");
            return Err(CloudResourceError::InvalidParameter(format!(
                "resource {} does not belong to cloud account {}",
                foreign, account_id
            )));
        }

        Ok(())
    }
}
