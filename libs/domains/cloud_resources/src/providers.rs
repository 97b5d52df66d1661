//! Contracts this crate needs from cloud providers and the cloud-account service.
//!
//! Concrete SDK clients live outside this crate. Each provider plugs in a
//! [`ProviderClients`] factory; a capability the provider does not offer is
//! reported as `Ok(None)`, which callers treat as "nothing to do".

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::error::CloudResourceResult;
use crate::models::{CloudAccount, CloudProvider, InstanceRef, ProviderInstance};

/// Error type for provider client operations
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Resolves cloud accounts and their credentials
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialsResolver: Send + Sync {
    /// Fetch one account with its credentials blob
    async fn get_credentials(&self, account_id: Uuid) -> CloudResourceResult<CloudAccount>;

    /// List every registered account
    async fn list_accounts(&self) -> CloudResourceResult<Vec<CloudAccount>>;
}

/// Lists the instances of one resource category
#[async_trait]
pub trait InstanceLister: Send + Sync {
    async fn list_instances(&self) -> ProviderResult<Vec<ProviderInstance>>;
}

/// Starts and stops instances
#[async_trait]
pub trait InstanceIdler: Send + Sync {
    async fn start_instance(&self, instance: &InstanceRef) -> ProviderResult<()>;

    async fn stop_instance(&self, instance: &InstanceRef) -> ProviderResult<()>;
}

/// One sample of a metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Samples of one metric for one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Name of the instance the samples belong to
    pub resource_name: String,
    pub points: Vec<DataPoint>,
}

impl TimeSeries {
    /// Highest sampled value, `None` when the series is empty
    pub fn peak(&self) -> Option<f64> {
        self.points
            .iter()
            .map(|p| p.value)
            .fold(None, |peak, v| match peak {
                Some(p) if p >= v => Some(p),
                _ => Some(v),
            })
    }
}

/// Reads monitoring time series
#[async_trait]
pub trait MetricsReader: Send + Sync {
    async fn get_time_series(
        &self,
        metric: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ProviderResult<Vec<TimeSeries>>;
}

/// Builds authenticated clients for one cloud provider.
///
/// Every method receives the account's opaque credentials blob and turns it
/// into provider credentials before constructing the client.
#[async_trait]
pub trait ProviderClients: Send + Sync {
    fn provider(&self) -> CloudProvider;

    async fn sql_lister(
        &self,
        _credentials: &serde_json::Value,
    ) -> ProviderResult<Option<Box<dyn InstanceLister>>> {
        Ok(None)
    }

    async fn compute_lister(
        &self,
        _credentials: &serde_json::Value,
    ) -> ProviderResult<Option<Box<dyn InstanceLister>>> {
        Ok(None)
    }

    async fn sql_idler(
        &self,
        _credentials: &serde_json::Value,
    ) -> ProviderResult<Option<Box<dyn InstanceIdler>>> {
        Ok(None)
    }

    async fn metrics_reader(
        &self,
        _credentials: &serde_json::Value,
    ) -> ProviderResult<Option<Box<dyn MetricsReader>>> {
        Ok(None)
    }
}

/// Registry of provider client factories, keyed by provider
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<CloudProvider, Arc<dyn ProviderClients>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, replacing any previous one for the same provider
    pub fn register(&mut self, clients: Arc<dyn ProviderClients>) {
        self.providers.insert(clients.provider(), clients);
    }

    pub fn with(mut self, clients: Arc<dyn ProviderClients>) -> Self {
        self.register(clients);
        self
    }

    pub fn get(&self, provider: CloudProvider) -> Option<&dyn ProviderClients> {
        self.providers.get(&provider).map(|c| c.as_ref())
    }

    pub fn providers(&self) -> impl Iterator<Item = CloudProvider> + '_ {
        self.providers.keys().copied()
    }
}
