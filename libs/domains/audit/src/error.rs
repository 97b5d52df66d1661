//! Audit domain error types

use domain_cloud_resources::{CloudResourceError, ProviderError};
use strum::Display;
use thiserror::Error;

/// Result type for audit operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Kind of entity a lookup failed to find
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum AuditEntity {
    Rule,
    Category,
    Result,
}

/// Audit domain errors
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("{entity} not found: {value}")]
    NotFound { entity: AuditEntity, value: String },

    #[error("Duplicate rule name: {0}")]
    DuplicateRule(String),

    /// Credential lookup or a provider call failed
    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl AuditError {
    pub fn not_found(entity: AuditEntity, value: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            value: value.into(),
        }
    }
}

impl From<CloudResourceError> for AuditError {
    fn from(err: CloudResourceError) -> Self {
        match err {
            CloudResourceError::Database(message) => Self::Database(message),
            other => Self::Upstream(other.to_string()),
        }
    }
}

impl From<ProviderError> for AuditError {
    fn from(err: ProviderError) -> Self {
        Self::Upstream(err.to_string())
    }
}

impl From<sea_orm::DbErr> for AuditError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        Self::Database(format!("Invalid result payload: {}", err))
    }
}
