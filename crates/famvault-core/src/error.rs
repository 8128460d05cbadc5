//! Error types for the FamVault system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    /// Unknown or disabled tenant.
    #[error("Invalid tenant")]
    InvalidTenant,

    /// Any authentication failure. Deliberately carries no detail so
    /// callers cannot tell which check failed.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("No permissions assigned to your role")]
    NoPermissions,

    #[error("Access denied: missing permission for this action")]
    PermissionDenied,

    #[error("Entity already exists: {entity} with duplicate {field}")]
    Conflict { entity: String, field: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type VaultResult<T> = Result<T, VaultError>;
