//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. The tenant directory lives in
//! the central store; every other repository is bound to exactly one
//! tenant store, so isolation comes from the store itself rather than
//! from a `tenant_id` column.
//!
//! Reads of entities with encrypted fields take [`ReadOptions`]. When
//! the options carry a tenant context the returned entities are
//! decrypted; otherwise they come back exactly as stored.

use uuid::Uuid;

use crate::error::VaultResult;
use crate::guard::TenantContext;
use crate::models::{
    admin_user::{AdminUser, CreateAdminUser},
    bank_account::{BankAccount, CreateBankAccount, UpdateBankAccount},
    family_member::{CreateFamilyMember, FamilyMember, UpdateFamilyMember},
    role::{CreateRole, Role, UpdateRole},
    tenant::{CreateTenant, Tenant},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

/// Per-read options.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Tenant whose key decrypts guarded fields of the returned entities.
    pub tenant: Option<TenantContext>,
}

impl ReadOptions {
    pub fn for_tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant: Some(TenantContext::new(tenant_id)),
        }
    }
}

// ---------------------------------------------------------------------------
// Central directory
// ---------------------------------------------------------------------------

pub trait TenantDirectory: Send + Sync {
    fn create(&self, input: CreateTenant) -> impl Future<Output = VaultResult<Tenant>> + Send;
    /// Look up a tenant by its public id. `Ok(None)` when absent.
    fn get_by_tenant_id(
        &self,
        tenant_id: &str,
    ) -> impl Future<Output = VaultResult<Option<Tenant>>> + Send;
    fn get_by_email(&self, email: &str)
    -> impl Future<Output = VaultResult<Option<Tenant>>> + Send;
    fn set_enabled(
        &self,
        tenant_id: &str,
        enabled: bool,
    ) -> impl Future<Output = VaultResult<Tenant>> + Send;
    fn update_modules(
        &self,
        tenant_id: &str,
        modules: Vec<String>,
    ) -> impl Future<Output = VaultResult<Tenant>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = VaultResult<PaginatedResult<Tenant>>> + Send;
}

// ---------------------------------------------------------------------------
// Tenant-store repositories
// ---------------------------------------------------------------------------

pub trait AdminUserRepository: Send + Sync {
    fn create(&self, input: CreateAdminUser) -> impl Future<Output = VaultResult<AdminUser>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = VaultResult<AdminUser>> + Send;
    /// Match on either the username or the email column.
    fn find_by_username_or_email(
        &self,
        username_or_email: &str,
    ) -> impl Future<Output = VaultResult<Option<AdminUser>>> + Send;
}

pub trait FamilyMemberRepository: Send + Sync {
    fn create(
        &self,
        input: CreateFamilyMember,
    ) -> impl Future<Output = VaultResult<FamilyMember>> + Send;
    fn get_by_id(
        &self,
        id: Uuid,
        options: &ReadOptions,
    ) -> impl Future<Output = VaultResult<FamilyMember>> + Send;
    fn find_by_email(
        &self,
        email: &str,
        options: &ReadOptions,
    ) -> impl Future<Output = VaultResult<Option<FamilyMember>>> + Send;
    /// All members, newest first.
    fn list(&self, options: &ReadOptions)
    -> impl Future<Output = VaultResult<Vec<FamilyMember>>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateFamilyMember,
    ) -> impl Future<Output = VaultResult<FamilyMember>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = VaultResult<()>> + Send;
}

pub trait BankAccountRepository: Send + Sync {
    fn create(
        &self,
        input: CreateBankAccount,
    ) -> impl Future<Output = VaultResult<BankAccount>> + Send;
    fn get_by_id(
        &self,
        id: Uuid,
        options: &ReadOptions,
    ) -> impl Future<Output = VaultResult<BankAccount>> + Send;
    /// All accounts, newest first.
    fn list(&self, options: &ReadOptions)
    -> impl Future<Output = VaultResult<Vec<BankAccount>>> + Send;
    fn list_by_member(
        &self,
        member_id: Uuid,
        options: &ReadOptions,
    ) -> impl Future<Output = VaultResult<Vec<BankAccount>>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateBankAccount,
    ) -> impl Future<Output = VaultResult<BankAccount>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = VaultResult<()>> + Send;
}

pub trait RoleRepository: Send + Sync {
    fn create(&self, input: CreateRole) -> impl Future<Output = VaultResult<Role>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = VaultResult<Role>> + Send;
    /// The active role with this exact name, if any.
    fn find_active_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = VaultResult<Option<Role>>> + Send;
    /// All roles, newest first.
    fn list(&self) -> impl Future<Output = VaultResult<Vec<Role>>> + Send;
    fn list_active(&self) -> impl Future<Output = VaultResult<Vec<Role>>> + Send;
    fn update(&self, id: Uuid, input: UpdateRole) -> impl Future<Output = VaultResult<Role>> + Send;
    /// Soft-delete: sets `is_active` to false.
    fn deactivate(&self, id: Uuid) -> impl Future<Output = VaultResult<Role>> + Send;
}
