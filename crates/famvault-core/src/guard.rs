//! Tenant context and guarded-field access.
//!
//! A [`TenantContext`] names the tenant whose key encrypts or decrypts
//! an entity's protected fields. It is carried alongside entities and
//! read options only; repositories never write it to a store.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ephemeral tenant id used to derive the field-encryption key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantContext(String);

impl TenantContext {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self(tenant_id.into())
    }

    pub fn tenant_id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Named access to the string fields a field guard may rewrite.
///
/// `guarded_field_mut` returns `None` when the field is unknown or not
/// set on this value. For patch types an unset field counts as
/// unmodified, so only the fields a caller actually changes are
/// re-encrypted.
pub trait GuardedFields {
    fn guarded_field_mut(&mut self, name: &str) -> Option<&mut String>;
}

/// Values that can be stamped with a tenant context before they are
/// persisted.
pub trait TenantScoped {
    fn tenant_context(&self) -> Option<&TenantContext>;

    fn set_tenant_context(&mut self, tenant_id: impl Into<String>);
}
