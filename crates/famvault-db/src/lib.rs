//! FamVault Database: SurrealDB stores, the tenant connection registry
//! and repository implementations.
//!
//! This crate provides:
//! - Store connectors ([`StoreConnector`], [`RemoteConnector`], [`MemoryConnector`])
//! - The per-tenant store cache ([`TenantConnectionRegistry`], [`TenantStore`])
//! - Schema migrations for the directory and for tenant stores
//! - Repository implementations of the `famvault-core` traits
//! - Tenant provisioning ([`TenantProvisioner`])

mod connection;
mod error;
mod password;
mod provision;
mod registry;
pub mod repository;
mod schema;

pub use connection::{DbConfig, MemoryConnector, RemoteConnector, StoreConnector};
pub use error::DbError;
pub use password::hash_password;
pub use provision::{ProvisionTenant, ProvisionedTenant, TenantProvisioner, generate_tenant_id};
pub use registry::{BoundCollection, TenantConnectionRegistry, TenantStore, tenant_database_name};
pub use schema::{run_directory_migrations, run_tenant_migrations};

/// Name of the central directory database.
pub const DIRECTORY_DATABASE: &str = "directory";
