//! Concurrent enumeration of an account's resources across resource categories.

use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::CloudResourceResult;
use crate::models::{CloudAccount, DiscoveredResource, ResourceType};
use crate::providers::{InstanceLister, ProviderRegistry};

/// Queries every resource-category lister of an account's provider.
#[derive(Clone)]
pub struct ResourceFetcher {
    providers: Arc<ProviderRegistry>,
}

impl ResourceFetcher {
    pub fn new(providers: Arc<ProviderRegistry>) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// List SQL and compute instances of `account` concurrently.
    ///
    /// Both listings run to completion before this returns. If either fails
    /// the call fails and the other listing is discarded; when both fail the
    /// SQL error wins. Categories the provider does not support contribute
    /// nothing. No timeout is applied here.
    #[instrument(skip(self, account), fields(account_id = %account.id, provider = %account.provider))]
    pub async fn fetch_all(
        &self,
        account: &CloudAccount,
    ) -> CloudResourceResult<Vec<DiscoveredResource>> {
        let (sql, compute) = tokio::join!(
            self.list_category(account, ResourceType::Sql),
            self.list_category(account, ResourceType::Compute),
        );

        let mut resources = sql?;
        resources.extend(compute?);

        debug!(count = resources.len(), "Fetched resources from provider");
        Ok(resources)
    }

    async fn list_category(
        &self,
        account: &CloudAccount,
        resource_type: ResourceType,
    ) -> CloudResourceResult<Vec<DiscoveredResource>> {
        let Some(clients) = self.providers.get(account.provider) else {
            debug!(%resource_type, "No provider clients registered, skipping");
            return Ok(Vec::new());
        };

        let lister: Option<Box<dyn InstanceLister>> = match resource_type {
            ResourceType::Sql => clients.sql_lister(&account.credentials).await?,
            ResourceType::Compute => clients.compute_lister(&account.credentials).await?,
        };

        let Some(lister) = lister else {
            debug!(%resource_type, "Resource category not supported by provider, skipping");
            return Ok(Vec::new());
        };

        let account_ref = account.account_ref();
        let instances = lister.list_instances().await?;

        Ok(instances
            .into_iter()
            .map(|instance| instance.into_discovered(account_ref))
            .collect())
    }
}
