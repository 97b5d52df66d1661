use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};
use uuid::Uuid;
use validator::Validate;

/// Status label of a running instance
pub const RUNNING: &str = "RUNNING";
/// Status label of a stopped instance
pub const STOPPED: &str = "STOPPED";

/// Cloud provider
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CloudProvider {
    Aws,
    Gcp,
    Azure,
}

// The account service is not consistent about case ("GCP", "gcp").
impl TryFrom<String> for CloudProvider {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Category of a tracked resource
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum ResourceType {
    Sql,
    Compute,
}

/// A registered cloud account as returned by the cloud-account service.
///
/// `credentials` is an opaque provider-specific blob; only provider client
/// factories interpret it.
#[derive(Clone, Serialize, Deserialize)]
pub struct CloudAccount {
    pub id: Uuid,
    pub provider: CloudProvider,
    #[serde(default)]
    pub credentials: serde_json::Value,
}

impl CloudAccount {
    pub fn account_ref(&self) -> CloudAccountRef {
        CloudAccountRef {
            id: self.id,
            provider: self.provider,
        }
    }
}

impl fmt::Debug for CloudAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudAccount")
            .field("id", &self.id)
            .field("provider", &self.provider)
            .field("credentials", &"<redacted>")
            .finish()
    }
}

/// Account tag carried by every resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudAccountRef {
    pub id: Uuid,
    pub provider: CloudProvider,
}

/// A resource as stored in the inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    /// Provider-assigned identifier, unique within a cloud account
    pub uid: String,
    pub name: String,
    pub resource_type: ResourceType,
    pub status: String,
    pub cloud_account: CloudAccountRef,
    pub settings: serde_json::Value,
    pub region: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// Build a stored resource from a discovered one, assigning a fresh ID
    pub fn new(input: DiscoveredResource) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::now_v7(),
            uid: input.uid,
            name: input.name,
            resource_type: input.resource_type,
            status: input.status,
            cloud_account: input.cloud_account,
            settings: input.settings,
            region: input.region,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn instance_ref(&self) -> InstanceRef {
        InstanceRef {
            uid: self.uid.clone(),
            name: self.name.clone(),
            region: self.region.clone(),
        }
    }
}

/// A resource as observed on the provider, before it has a store ID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredResource {
    pub uid: String,
    pub name: String,
    pub resource_type: ResourceType,
    pub status: String,
    pub cloud_account: CloudAccountRef,
    #[serde(default)]
    pub settings: serde_json::Value,
    pub region: String,
}

/// An instance as reported by a provider lister, not yet tagged with its account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderInstance {
    pub uid: String,
    pub name: String,
    pub resource_type: ResourceType,
    pub status: String,
    #[serde(default)]
    pub settings: serde_json::Value,
    pub region: String,
}

impl ProviderInstance {
    pub fn into_discovered(self, cloud_account: CloudAccountRef) -> DiscoveredResource {
        DiscoveredResource {
            uid: self.uid,
            name: self.name,
            resource_type: self.resource_type,
            status: self.status,
            cloud_account,
            settings: self.settings,
            region: self.region,
        }
    }
}

/// What a provider needs to address a single instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRef {
    pub uid: String,
    pub name: String,
    pub region: String,
}

/// Desired state of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum ResourceState {
    Start,
    Suspend,
}

impl ResourceState {
    /// Status label a resource carries once the transition is applied
    pub fn target_status(self) -> &'static str {
        match self {
            ResourceState::Start => RUNNING,
            ResourceState::Suspend => STOPPED,
        }
    }
}

/// Input of a state change request
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDetails {
    pub id: Uuid,
    pub cloud_account_id: Uuid,
    pub resource_type: ResourceType,
    pub state: ResourceState,
}

/// Outcome of syncing every registered account
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncSummary {
    pub accounts_synced: usize,
    pub accounts_failed: usize,
    pub resources: usize,
}

// ============================================================================
// Resource groups
// ============================================================================

/// A named set of resources inside one cloud account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceGroup {
    pub id: Uuid,
    pub cloud_account_id: Uuid,
    pub name: String,
    pub description: String,
    pub resource_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a resource group
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateResourceGroup {
    pub cloud_account_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 1024))]
    pub description: String,
    #[serde(default)]
    pub resource_ids: Vec<Uuid>,
}

/// DTO for updating a resource group
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateResourceGroup {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 1024))]
    pub description: Option<String>,
    pub resource_ids: Option<Vec<Uuid>>,
}

impl ResourceGroup {
    pub fn new(input: CreateResourceGroup) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::now_v7(),
            cloud_account_id: input.cloud_account_id,
            name: input.name,
            description: input.description,
            resource_ids: input.resource_ids,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply updates from UpdateResourceGroup DTO
    pub fn apply_update(&mut self, update: UpdateResourceGroup) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(resource_ids) = update.resource_ids {
            self.resource_ids = resource_ids;
        }
        self.updated_at = Utc::now();
    }
}
