//! Tenant domain model.
//!
//! Tenants are recorded in the central directory. Each tenant owns a
//! dedicated, isolated store holding its users, family members, roles
//! and financial records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Modules every newly provisioned tenant starts with.
pub const DEFAULT_MODULES: &[&str] = &["family", "investment", "loan", "insurance", "documents"];

/// A directory entry for one tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    /// Directory record id.
    pub id: Uuid,
    /// Public tenant id (six digits) used to address the tenant store.
    pub tenant_id: String,
    /// Contact email of the tenant owner. Unique across the directory.
    pub email: String,
    pub display_name: String,
    /// Keys of the modules enabled for this tenant.
    pub modules: Vec<String>,
    /// Disabled tenants cannot log in.
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a directory entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub tenant_id: String,
    pub email: String,
    pub display_name: String,
    pub modules: Vec<String>,
}
