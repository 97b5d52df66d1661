use crate::{env_parse, env_required, ConfigError, FromEnv};
use std::time::Duration;

/// Connection settings for the cloud-account service that owns credentials.
#[derive(Clone, Debug)]
pub struct CloudAccountsConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl CloudAccountsConfig {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// URL of the account collection, e.g. `http://accounts/cloud-accounts`
    pub fn accounts_url(&self) -> String {
        format!("{}/cloud-accounts", self.base_url)
    }

    /// URL returning the credentials of a single account
    pub fn credentials_url(&self, account_id: impl std::fmt::Display) -> String {
        format!("{}/cloud-accounts/{}/credentials", self.base_url, account_id)
    }
}

impl FromEnv for CloudAccountsConfig {
    /// - CLOUD_ACCOUNTS_URL: required
    /// - CLOUD_ACCOUNTS_TIMEOUT_SECS: defaults to 10
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = env_required("CLOUD_ACCOUNTS_URL")?;
        let timeout_secs: u64 = env_parse("CLOUD_ACCOUNTS_TIMEOUT_SECS", 10)?;

        Ok(Self::new(base_url, Duration::from_secs(timeout_secs)))
    }
}
