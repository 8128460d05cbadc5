//! SurrealDB repository implementations.
//!
//! The directory repository talks to the central `directory` database.
//! All others are bound to a single tenant store through
//! [`TenantStore::collection`](crate::registry::TenantStore::collection).

mod admin_user;
mod bank_account;
mod directory;
mod family_member;
mod role;

pub use admin_user::SurrealAdminUserRepository;
pub use bank_account::SurrealBankAccountRepository;
pub use directory::SurrealTenantDirectory;
pub use family_member::SurrealFamilyMemberRepository;
pub use role::SurrealRoleRepository;

use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// Row struct for existence checks.
#[derive(Debug, SurrealValue)]
struct IdRow {
    #[allow(dead_code)]
    record_id: String,
}

fn parse_uuid(value: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Decode(format!("invalid {what} UUID: {e}")))
}
