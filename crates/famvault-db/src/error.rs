//! Database-specific error types and conversions.

use famvault_core::error::VaultError;
use famvault_crypto::CryptoError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Corrupt record: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Duplicate {field} for {entity}")]
    Conflict { entity: String, field: String },

    #[error("Tenant store for {0} was closed while in use")]
    Closed(String),

    #[error("Invalid tenant id: {0:?}")]
    InvalidTenantId(String),

    #[error("Password hashing failed: {0}")]
    Password(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl From<DbError> for VaultError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => VaultError::NotFound { entity, id },
            DbError::Conflict { entity, field } => VaultError::Conflict { entity, field },
            DbError::InvalidTenantId(_) => VaultError::InvalidTenant,
            DbError::Crypto(e) => e.into(),
            other => VaultError::Database(other.to_string()),
        }
    }
}

/// Classify a failed write. Unique-index violations become
/// [`DbError::Conflict`], naming the field whose index rejected the
/// write; anything else is a plain query failure.
pub(crate) fn write_error(err: surrealdb::Error, entity: &str, indexes: &[(&str, &str)]) -> DbError {
    let message = err.to_string();
    if message.contains("already contains") {
        let field = indexes
            .iter()
            .find(|(index, _)| message.contains(index))
            .map(|(_, field)| *field)
            .unwrap_or("unique field");
        return DbError::Conflict {
            entity: entity.into(),
            field: field.into(),
        };
    }
    DbError::Query(message)
}
