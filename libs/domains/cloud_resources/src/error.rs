use thiserror::Error;
use uuid::Uuid;

use crate::providers::ProviderError;

pub type CloudResourceResult<T> = Result<T, CloudResourceError>;

#[derive(Debug, Error)]
pub enum CloudResourceError {
    #[error("Resource not found: {0}")]
    ResourceNotFound(Uuid),

    #[error("Resource group not found: {0}")]
    GroupNotFound(Uuid),

    #[error("Cloud account not found: {0}")]
    AccountNotFound(Uuid),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Duplicate resource group name: {0}")]
    DuplicateName(String),

    #[error("Duplicate resource uid in account: {0}")]
    DuplicateUid(String),

    /// Credential resolution or a provider call failed
    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<ProviderError> for CloudResourceError {
    fn from(err: ProviderError) -> Self {
        CloudResourceError::Upstream(err.to_string())
    }
}

impl From<sea_orm::DbErr> for CloudResourceError {
    fn from(err: sea_orm::DbErr) -> Self {
        CloudResourceError::Database(err.to_string())
    }
}
