use async_trait::async_trait;
use domain_cloud_resources::CloudAccount;

use crate::error::Result;
use crate::models::Item;

/// A named, categorized check evaluated against one cloud account.
///
/// Rules are provider agnostic at this level; an implementation decides
/// per provider what to inspect and returns no items when the provider is
/// not supported.
#[async_trait]
pub trait AuditRule: Send + Sync {
    fn category(&self) -> &str;

    /// Unique rule name, also used as the rule id
    fn name(&self) -> &str;

    async fn execute(&self, account: &CloudAccount) -> Result<Vec<Item>>;
}
