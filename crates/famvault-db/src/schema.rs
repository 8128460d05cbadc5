//! Schema definitions and migration runner for SurrealDB.
//!
//! Two independent migration lists exist: one for the central tenant
//! directory and one applied to every tenant store when the registry
//! first opens it. All table definitions use SCHEMAFULL mode. UUIDs are
//! stored as strings. Enums are stored as strings with ASSERT
//! constraints where the field is required.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static DIRECTORY_MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "directory_initial_schema",
    sql: DIRECTORY_SCHEMA_V1,
}];

static TENANT_MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "tenant_initial_schema",
    sql: TENANT_SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Central directory
// -----------------------------------------------------------------------

const DIRECTORY_SCHEMA_V1: &str = "\
DEFINE TABLE tenant SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE tenant TYPE string;
DEFINE FIELD email ON TABLE tenant TYPE string;
DEFINE FIELD display_name ON TABLE tenant TYPE string;
DEFINE FIELD modules ON TABLE tenant TYPE array<string> DEFAULT [];
DEFINE FIELD enabled ON TABLE tenant TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tenant_tenant_id ON TABLE tenant \
    COLUMNS tenant_id UNIQUE;
DEFINE INDEX idx_tenant_email ON TABLE tenant \
    COLUMNS email UNIQUE;
";

// -----------------------------------------------------------------------
// Tenant store
// -----------------------------------------------------------------------

const TENANT_SCHEMA_V1: &str = "\
-- =======================================================================
-- Admin users
-- =======================================================================
DEFINE TABLE admin_user SCHEMAFULL;
DEFINE FIELD username ON TABLE admin_user TYPE string;
DEFINE FIELD email ON TABLE admin_user TYPE string;
DEFINE FIELD password_hash ON TABLE admin_user TYPE string;
DEFINE FIELD roles ON TABLE admin_user TYPE array<string> DEFAULT [];
DEFINE FIELD created_at ON TABLE admin_user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_admin_user_username ON TABLE admin_user \
    COLUMNS username UNIQUE;
DEFINE INDEX idx_admin_user_email ON TABLE admin_user COLUMNS email;

-- =======================================================================
-- Family members
-- =======================================================================
DEFINE TABLE family_member SCHEMAFULL;
DEFINE FIELD name ON TABLE family_member TYPE string;
DEFINE FIELD gender ON TABLE family_member TYPE option<string>;
DEFINE FIELD date_of_birth ON TABLE family_member TYPE option<string>;
DEFINE FIELD contact_number ON TABLE family_member TYPE option<string>;
DEFINE FIELD email ON TABLE family_member TYPE string;
DEFINE FIELD address ON TABLE family_member TYPE option<string>;
DEFINE FIELD relation ON TABLE family_member TYPE option<string>;
DEFINE FIELD occupation ON TABLE family_member TYPE option<string>;
DEFINE FIELD education ON TABLE family_member TYPE option<string>;
DEFINE FIELD marital_status ON TABLE family_member TYPE option<string>;
DEFINE FIELD income ON TABLE family_member TYPE option<float>;
DEFINE FIELD password_hash ON TABLE family_member TYPE option<string>;
DEFINE FIELD metadata ON TABLE family_member TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD created_at ON TABLE family_member TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE family_member TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_family_member_email ON TABLE family_member \
    COLUMNS email UNIQUE;

-- =======================================================================
-- Bank accounts
-- =======================================================================
DEFINE TABLE bank_account SCHEMAFULL;
DEFINE FIELD member_id ON TABLE bank_account TYPE string;
DEFINE FIELD account_holder_name ON TABLE bank_account TYPE string;
DEFINE FIELD bank_name ON TABLE bank_account TYPE string;
DEFINE FIELD branch_name ON TABLE bank_account TYPE option<string>;
DEFINE FIELD ifsc ON TABLE bank_account TYPE option<string>;
DEFINE FIELD account_number ON TABLE bank_account TYPE string;
DEFINE FIELD account_type ON TABLE bank_account TYPE string \
    ASSERT $value IN ['Savings', 'Current', 'Other'];
DEFINE FIELD currency ON TABLE bank_account TYPE string DEFAULT 'INR';
DEFINE FIELD is_primary ON TABLE bank_account TYPE bool DEFAULT false;
DEFINE FIELD verified ON TABLE bank_account TYPE bool DEFAULT false;
DEFINE FIELD status ON TABLE bank_account TYPE string \
    ASSERT $value IN ['Active', 'Inactive', 'Closed'];
DEFINE FIELD created_at ON TABLE bank_account TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE bank_account TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_bank_account_member ON TABLE bank_account \
    COLUMNS member_id;

-- =======================================================================
-- Roles
-- =======================================================================
DEFINE TABLE role SCHEMAFULL;
DEFINE FIELD name ON TABLE role TYPE string;
DEFINE FIELD permissions ON TABLE role TYPE array DEFAULT [];
DEFINE FIELD permissions.* ON TABLE role TYPE object;
DEFINE FIELD permissions.*.module_key ON TABLE role TYPE string;
DEFINE FIELD permissions.*.actions ON TABLE role TYPE array<string>;
DEFINE FIELD is_active ON TABLE role TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_role_name ON TABLE role COLUMNS name UNIQUE;
";

// -----------------------------------------------------------------------
// Migration runner
// -----------------------------------------------------------------------

/// Apply pending directory migrations.
pub async fn run_directory_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    apply(db, DIRECTORY_MIGRATIONS).await
}

/// Apply pending tenant-store migrations.
pub async fn run_tenant_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    apply(db, TENANT_MIGRATIONS).await
}

/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
async fn apply<C: Connection>(db: &Surreal<C>, migrations: &[Migration]) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in migrations {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;
        }
    }

    Ok(())
}
