//! Family member domain model (tenant store).
//!
//! Family members are the second class of principal: they may log in
//! with their own password, or, when none is set, through the
//! date-of-birth / contact-number fallback.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::guard::{GuardedFields, TenantContext, TenantScoped};

/// Fields stored encrypted with the tenant key.
pub const ENCRYPTED_FIELDS: &[&str] = &["contact_number", "address"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MaritalStatus {
    Single,
    Married,
    Widowed,
    Divorced,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyMember {
    pub id: Uuid,
    pub name: String,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub contact_number: Option<String>,
    pub email: String,
    pub address: Option<String>,
    /// Relation to the account holder (e.g. Father, Daughter).
    pub relation: Option<String>,
    pub occupation: Option<String>,
    pub education: Option<String>,
    pub marital_status: Option<MaritalStatus>,
    pub income: Option<f64>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GuardedFields for FamilyMember {
    fn guarded_field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "contact_number" => self.contact_number.as_mut(),
            "address" => self.address.as_mut(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateFamilyMember {
    pub name: String,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub contact_number: Option<String>,
    pub email: String,
    pub address: Option<String>,
    pub relation: Option<String>,
    pub occupation: Option<String>,
    pub education: Option<String>,
    pub marital_status: Option<MaritalStatus>,
    pub income: Option<f64>,
    pub metadata: Option<serde_json::Value>,
    /// Raw password; `None` leaves the member on the fallback login rule.
    pub password: Option<String>,
    #[serde(skip)]
    pub tenant_context: Option<TenantContext>,
}

impl GuardedFields for CreateFamilyMember {
    fn guarded_field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "contact_number" => self.contact_number.as_mut(),
            "address" => self.address.as_mut(),
            _ => None,
        }
    }
}

impl TenantScoped for CreateFamilyMember {
    fn tenant_context(&self) -> Option<&TenantContext> {
        self.tenant_context.as_ref()
    }

    fn set_tenant_context(&mut self, tenant_id: impl Into<String>) {
        self.tenant_context = Some(TenantContext::new(tenant_id));
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateFamilyMember {
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub relation: Option<String>,
    pub occupation: Option<String>,
    pub education: Option<String>,
    pub marital_status: Option<MaritalStatus>,
    pub income: Option<f64>,
    pub metadata: Option<serde_json::Value>,
    /// New raw password. Blank values are ignored.
    pub password: Option<String>,
    #[serde(skip)]
    pub tenant_context: Option<TenantContext>,
}

impl GuardedFields for UpdateFamilyMember {
    fn guarded_field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "contact_number" => self.contact_number.as_mut(),
            "address" => self.address.as_mut(),
            _ => None,
        }
    }
}

impl TenantScoped for UpdateFamilyMember {
    fn tenant_context(&self) -> Option<&TenantContext> {
        self.tenant_context.as_ref()
    }

    fn set_tenant_context(&mut self, tenant_id: impl Into<String>) {
        self.tenant_context = Some(TenantContext::new(tenant_id));
    }
}
