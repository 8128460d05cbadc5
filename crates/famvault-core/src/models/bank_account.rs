//! Bank account domain model (tenant store).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::guard::{GuardedFields, TenantContext, TenantScoped};

/// Fields stored encrypted with the tenant key.
pub const ENCRYPTED_FIELDS: &[&str] = &["account_number", "ifsc"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum AccountType {
    #[default]
    Savings,
    Current,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: Uuid,
    /// Owning family member.
    pub member_id: Uuid,
    pub account_holder_name: String,
    pub bank_name: String,
    pub branch_name: Option<String>,
    pub ifsc: Option<String>,
    pub account_number: String,
    pub account_type: AccountType,
    pub currency: String,
    pub is_primary: bool,
    pub verified: bool,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GuardedFields for BankAccount {
    fn guarded_field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "account_number" => Some(&mut self.account_number),
            "ifsc" => self.ifsc.as_mut(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateBankAccount {
    pub member_id: Uuid,
    pub account_holder_name: String,
    pub bank_name: String,
    pub branch_name: Option<String>,
    pub ifsc: Option<String>,
    pub account_number: String,
    pub account_type: AccountType,
    /// Defaults to `INR` when absent.
    pub currency: Option<String>,
    pub is_primary: bool,
    #[serde(skip)]
    pub tenant_context: Option<TenantContext>,
}

impl GuardedFields for CreateBankAccount {
    fn guarded_field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "account_number" => Some(&mut self.account_number),
            "ifsc" => self.ifsc.as_mut(),
            _ => None,
        }
    }
}

impl TenantScoped for CreateBankAccount {
    fn tenant_context(&self) -> Option<&TenantContext> {
        self.tenant_context.as_ref()
    }

    fn set_tenant_context(&mut self, tenant_id: impl Into<String>) {
        self.tenant_context = Some(TenantContext::new(tenant_id));
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateBankAccount {
    pub account_holder_name: Option<String>,
    pub bank_name: Option<String>,
    pub branch_name: Option<String>,
    pub ifsc: Option<String>,
    pub account_number: Option<String>,
    pub account_type: Option<AccountType>,
    pub currency: Option<String>,
    pub is_primary: Option<bool>,
    pub verified: Option<bool>,
    pub status: Option<AccountStatus>,
    #[serde(skip)]
    pub tenant_context: Option<TenantContext>,
}

impl GuardedFields for UpdateBankAccount {
    fn guarded_field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "account_number" => self.account_number.as_mut(),
            "ifsc" => self.ifsc.as_mut(),
            _ => None,
        }
    }
}

impl TenantScoped for UpdateBankAccount {
    fn tenant_context(&self) -> Option<&TenantContext> {
        self.tenant_context.as_ref()
    }

    fn set_tenant_context(&mut self, tenant_id: impl Into<String>) {
        self.tenant_context = Some(TenantContext::new(tenant_id));
    }
}
