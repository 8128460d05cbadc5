//! Tenant provisioning and offboarding.
//!
//! Provisioning spans both stores: a directory record is created first,
//! then the tenant store is opened (which applies the tenant schema) and
//! the initial admin user is seeded into it.

use std::sync::Arc;

use famvault_core::error::{VaultError, VaultResult};
use famvault_core::models::admin_user::{AdminUser, CreateAdminUser};
use famvault_core::models::tenant::{CreateTenant, DEFAULT_MODULES, Tenant};
use famvault_core::repository::{AdminUserRepository, TenantDirectory};
use rand::Rng;
use tracing::{info, warn};

use crate::connection::StoreConnector;
use crate::registry::TenantConnectionRegistry;

/// Attempts at drawing an unused tenant id before giving up.
const MAX_ID_ATTEMPTS: usize = 32;

/// Input for [`TenantProvisioner::provision`].
#[derive(Debug, Clone)]
pub struct ProvisionTenant {
    pub email: String,
    pub username: String,
    /// Raw admin password.
    pub password: String,
    /// Defaults to `username` when absent.
    pub display_name: Option<String>,
}

/// Result of a successful provisioning.
#[derive(Debug, Clone)]
pub struct ProvisionedTenant {
    pub tenant: Tenant,
    pub admin: AdminUser,
}

/// Random six-digit tenant id (`100000..=999999`).
pub fn generate_tenant_id() -> String {
    rand::rng().random_range(100_000u32..1_000_000).to_string()
}

pub struct TenantProvisioner<D: TenantDirectory, K: StoreConnector> {
    directory: Arc<D>,
    registry: Arc<TenantConnectionRegistry<K>>,
}

impl<D: TenantDirectory, K: StoreConnector> TenantProvisioner<D, K> {
    pub fn new(directory: Arc<D>, registry: Arc<TenantConnectionRegistry<K>>) -> Self {
        Self {
            directory,
            registry,
        }
    }

    pub async fn provision(&self, input: ProvisionTenant) -> VaultResult<ProvisionedTenant> {
        if input.email.trim().is_empty() || input.username.trim().is_empty() {
            return Err(VaultError::Validation {
                message: "email and username are required".into(),
            });
        }
        if input.password.is_empty() {
            return Err(VaultError::Validation {
                message: "password is required".into(),
            });
        }

        if self.directory.get_by_email(&input.email).await?.is_some() {
            return Err(VaultError::Conflict {
                entity: "tenant".into(),
                field: "email".into(),
            });
        }

        let display_name = input
            .display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| input.username.clone());

        let tenant = self.create_directory_entry(&input.email, display_name).await?;
        let store = self
            .registry
            .get_or_create_connection(&tenant.tenant_id)
            .await?;

        let admin = store
            .admin_users()
            .create(CreateAdminUser {
                username: input.username,
                email: input.email,
                password: input.password,
                roles: vec!["admin".into()],
            })
            .await?;

        info!(
            tenant_id = %tenant.tenant_id,
            admin_id = %admin.id,
            "Tenant provisioned"
        );

        Ok(ProvisionedTenant { tenant, admin })
    }

    /// Draw six-digit ids until one is free. A concurrent provisioning
    /// that wins the same id is caught by the unique index and retried.
    async fn create_directory_entry(
        &self,
        email: &str,
        display_name: String,
    ) -> VaultResult<Tenant> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let tenant_id = generate_tenant_id();
            if self.directory.get_by_tenant_id(&tenant_id).await?.is_some() {
                continue;
            }

            let created = self
                .directory
                .create(CreateTenant {
                    tenant_id: tenant_id.clone(),
                    email: email.to_string(),
                    display_name: display_name.clone(),
                    modules: DEFAULT_MODULES.iter().map(|m| m.to_string()).collect(),
                })
                .await;

            match created {
                Ok(tenant) => return Ok(tenant),
                Err(VaultError::Conflict { field, .. }) if field == "tenant_id" => {
                    warn!(tenant_id = %tenant_id, "Tenant id taken concurrently, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(VaultError::Internal(
            "could not allocate an unused tenant id".into(),
        ))
    }

    /// Disable the tenant and release its store handle.
    pub async fn offboard(&self, tenant_id: &str) -> VaultResult<Tenant> {
        let tenant = self.directory.set_enabled(tenant_id, false).await?;
        self.registry.close_connection(tenant_id).await?;
        info!(tenant_id, "Tenant offboarded");
        Ok(tenant)
    }
}
