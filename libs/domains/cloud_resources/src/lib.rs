//! Cloud Resources Domain
//!
//! Keeps an internal inventory of cloud resources in sync with what the
//! providers report, and drives start/stop transitions on single resources.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   Service   │  ← sync, state changes, resource groups
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐     ┌─────────────┐
//! │    Fetch    │────►│  Providers  │  ← listers / idlers / metrics (external)
//! └──────┬──────┘     └─────────────┘
//!        │
//! ┌──────▼──────┐
//! │  Reconcile  │  ← pure plan + apply
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← store traits (in-memory + PostgreSQL)
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use core_config::{CloudAccountsConfig, FromEnv};
//! use domain_cloud_resources::{
//!     HttpCredentialsResolver, PgResourceStore, ProviderRegistry, ResourceService,
//! };
//! use sea_orm::Database;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("postgres://...").await?;
//! let resolver = HttpCredentialsResolver::new(CloudAccountsConfig::from_env()?)?;
//!
//! let service = ResourceService::new(
//!     PgResourceStore::new(db),
//!     Arc::new(resolver),
//!     Arc::new(ProviderRegistry::new()),
//! );
//! let summary = service.sync_all_accounts().await?;
//! # Ok(())
//! # }
//! ```

pub mod credentials;
pub mod entity;
pub mod error;
pub mod fetch;
pub mod models;
pub mod postgres;
pub mod providers;
pub mod reconcile;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use credentials::HttpCredentialsResolver;
pub use error::{CloudResourceError, CloudResourceResult};
pub use fetch::ResourceFetcher;
pub use models::{
    CloudAccount, CloudAccountRef, CloudProvider, CreateResourceGroup, DiscoveredResource,
    InstanceRef, ProviderInstance, Resource, ResourceDetails, ResourceGroup, ResourceState,
    ResourceType, SyncSummary, UpdateResourceGroup, RUNNING, STOPPED,
};
pub use postgres::PgResourceStore;
pub use providers::{
    CredentialsResolver, DataPoint, InstanceIdler, InstanceLister, MetricsReader, ProviderClients,
    ProviderError, ProviderRegistry, ProviderResult, TimeSeries,
};
pub use reconcile::{plan, reconcile, ReconcilePlan};
pub use repository::{InMemoryResourceStore, ResourceGroupStore, ResourceStore};
pub use service::ResourceService;
