//! HTTP client for the cloud-account service.

use async_trait::async_trait;
use core_config::CloudAccountsConfig;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::{CloudResourceError, CloudResourceResult};
use crate::models::CloudAccount;
use crate::providers::{CredentialsResolver, ProviderError};

/// Response envelope used by the cloud-account service
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Resolves accounts over HTTP.
///
/// - `GET {base}/cloud-accounts/{id}/credentials` returns one account
/// - `GET {base}/cloud-accounts` lists every account
pub struct HttpCredentialsResolver {
    config: CloudAccountsConfig,
    client: Client,
}

impl HttpCredentialsResolver {
    pub fn new(config: CloudAccountsConfig) -> CloudResourceResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProviderError::from)?;

        Ok(Self { config, client })
    }
}

fn decode<T: serde::de::DeserializeOwned>(body: &[u8]) -> CloudResourceResult<T> {
    serde_json::from_slice::<Envelope<T>>(body)
        .map(|envelope| envelope.data)
        .map_err(|e| ProviderError::Parse(e.to_string()).into())
}

#[async_trait]
impl CredentialsResolver for HttpCredentialsResolver {
    async fn get_credentials(&self, account_id: Uuid) -> CloudResourceResult<CloudAccount> {
        let url = self.config.credentials_url(account_id);
        debug!(account_id = %account_id, "Resolving cloud account credentials");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ProviderError::from)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CloudResourceError::AccountNotFound(account_id));
        }
        if !status.is_success() {
            error!(account_id = %account_id, status = %status, "Cloud-account service rejected credentials lookup");
            return Err(ProviderError::Api(format!("credentials lookup returned {}", status)).into());
        }

        let body = response.bytes().await.map_err(ProviderError::from)?;
        decode(&body)
    }

    async fn list_accounts(&self) -> CloudResourceResult<Vec<CloudAccount>> {
        let response = self
            .client
            .get(self.config.accounts_url())
            .send()
            .await
            .map_err(ProviderError::from)?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, "Cloud-account service rejected account listing");
            return Err(ProviderError::Api(format!("account listing returned {}", status)).into());
        }

        let body = response.bytes().await.map_err(ProviderError::from)?;
        decode(&body)
    }
}
