//! SurrealDB implementation of [`BankAccountRepository`].
//!
//! Account numbers are stored as fresh-nonce ciphertext, so two
//! encryptions of the same number never compare equal in the store.
//! Duplicate detection therefore decrypts every existing account of the
//! tenant and compares plaintext.

use chrono::{DateTime, Utc};
use famvault_core::error::VaultResult;
use famvault_core::guard::TenantContext;
use famvault_core::models::bank_account::{
    AccountStatus, AccountType, BankAccount, CreateBankAccount, UpdateBankAccount,
};
use famvault_core::repository::{BankAccountRepository, ReadOptions};
use famvault_crypto::FieldGuard;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::{IdRow, parse_uuid};
use crate::error::DbError;
use crate::registry::BoundCollection;

#[derive(Debug, SurrealValue)]
struct BankAccountRow {
    record_id: String,
    member_id: String,
    account_holder_name: String,
    bank_name: String,
    branch_name: Option<String>,
    ifsc: Option<String>,
    account_number: String,
    account_type: String,
    currency: String,
    is_primary: bool,
    verified: bool,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BankAccountRow {
    fn try_into_account(self) -> Result<BankAccount, DbError> {
        Ok(BankAccount {
            id: parse_uuid(&self.record_id, "bank_account")?,
            member_id: parse_uuid(&self.member_id, "member")?,
            account_holder_name: self.account_holder_name,
            bank_name: self.bank_name,
            branch_name: self.branch_name,
            ifsc: self.ifsc,
            account_number: self.account_number,
            account_type: parse_account_type(&self.account_type)?,
            currency: self.currency,
            is_primary: self.is_primary,
            verified: self.verified,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn parse_account_type(s: &str) -> Result<AccountType, DbError> {
    match s {
        "Savings" => Ok(AccountType::Savings),
        "Current" => Ok(AccountType::Current),
        "Other" => Ok(AccountType::Other),
        other => Err(DbError::Decode(format!("unknown account type: {other}"))),
    }
}

fn account_type_to_string(t: AccountType) -> &'static str {
    match t {
        AccountType::Savings => "Savings",
        AccountType::Current => "Current",
        AccountType::Other => "Other",
    }
}

fn parse_status(s: &str) -> Result<AccountStatus, DbError> {
    match s {
        "Active" => Ok(AccountStatus::Active),
        "Inactive" => Ok(AccountStatus::Inactive),
        "Closed" => Ok(AccountStatus::Closed),
        other => Err(DbError::Decode(format!("unknown account status: {other}"))),
    }
}

fn status_to_string(s: AccountStatus) -> &'static str {
    match s {
        AccountStatus::Active => "Active",
        AccountStatus::Inactive => "Inactive",
        AccountStatus::Closed => "Closed",
    }
}

/// Bank accounts of one tenant.
#[derive(Clone)]
pub struct SurrealBankAccountRepository<C: Connection> {
    db: Surreal<C>,
    guard: FieldGuard,
}

impl<C: Connection> BoundCollection<C> for SurrealBankAccountRepository<C> {
    const NAME: &'static str = "bank_account";
    const ENCRYPTED_FIELDS: &'static [&'static str] =
        famvault_core::models::bank_account::ENCRYPTED_FIELDS;

    fn bind(db: Surreal<C>, guard: FieldGuard, _pepper: Option<String>) -> Self {
        Self { db, guard }
    }
}

impl<C: Connection> SurrealBankAccountRepository<C> {
    fn decrypted(
        &self,
        rows: Vec<BankAccountRow>,
        context: Option<&TenantContext>,
    ) -> Result<Vec<BankAccount>, DbError> {
        let mut accounts = rows
            .into_iter()
            .map(BankAccountRow::try_into_account)
            .collect::<Result<Vec<_>, DbError>>()?;
        self.guard.after_load(&mut accounts, context);
        Ok(accounts)
    }

    async fn number_in_use(
        &self,
        account_number: &str,
        context: Option<&TenantContext>,
    ) -> Result<bool, DbError> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM bank_account")
            .await?;
        let rows: Vec<BankAccountRow> = result.take(0)?;
        let existing = self.decrypted(rows, context)?;
        debug!(checked = existing.len(), "Scanned bank accounts for duplicate number");
        Ok(existing
            .iter()
            .any(|account| account.account_number == account_number))
    }
}

impl<C: Connection> BankAccountRepository for SurrealBankAccountRepository<C> {
    async fn create(&self, mut input: CreateBankAccount) -> VaultResult<BankAccount> {
        if self
            .number_in_use(&input.account_number, input.tenant_context.as_ref())
            .await?
        {
            return Err(DbError::Conflict {
                entity: "bank_account".into(),
                field: "account_number".into(),
            }
            .into());
        }

        self.guard.before_persist(&mut input)?;

        let id_str = Uuid::new_v4().to_string();
        let result = self
            .db
            .query(
                "CREATE type::record('bank_account', $id) SET \
                 member_id = $member_id, \
                 account_holder_name = $account_holder_name, \
                 bank_name = $bank_name, branch_name = $branch_name, \
                 ifsc = $ifsc, account_number = $account_number, \
                 account_type = $account_type, currency = $currency, \
                 is_primary = $is_primary, verified = false, \
                 status = 'Active'; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('bank_account', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("member_id", input.member_id.to_string()))
            .bind(("account_holder_name", input.account_holder_name))
            .bind(("bank_name", input.bank_name))
            .bind(("branch_name", input.branch_name))
            .bind(("ifsc", input.ifsc))
            .bind(("account_number", input.account_number))
            .bind((
                "account_type",
                account_type_to_string(input.account_type).to_string(),
            ))
            .bind(("currency", input.currency.unwrap_or_else(|| "INR".into())))
            .bind(("is_primary", input.is_primary))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<BankAccountRow> = result.take(1).map_err(DbError::from)?;
        let account = self
            .decrypted(rows, input.tenant_context.as_ref())?
            .into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound {
                entity: "bank_account".into(),
                id: id_str,
            })?;

        Ok(account)
    }

    async fn get_by_id(&self, id: Uuid, options: &ReadOptions) -> VaultResult<BankAccount> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('bank_account', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BankAccountRow> = result.take(0).map_err(DbError::from)?;
        let account = self
            .decrypted(rows, options.tenant.as_ref())?
            .into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound {
                entity: "bank_account".into(),
                id: id_str,
            })?;

        Ok(account)
    }

    async fn list(&self, options: &ReadOptions) -> VaultResult<Vec<BankAccount>> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM bank_account ORDER BY created_at DESC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BankAccountRow> = result.take(0).map_err(DbError::from)?;
        Ok(self.decrypted(rows, options.tenant.as_ref())?)
    }

    async fn list_by_member(
        &self,
        member_id: Uuid,
        options: &ReadOptions,
    ) -> VaultResult<Vec<BankAccount>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM bank_account \
                 WHERE member_id = $member_id ORDER BY created_at DESC",
            )
            .bind(("member_id", member_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BankAccountRow> = result.take(0).map_err(DbError::from)?;
        Ok(self.decrypted(rows, options.tenant.as_ref())?)
    }

    async fn update(&self, id: Uuid, mut input: UpdateBankAccount) -> VaultResult<BankAccount> {
        self.guard.before_persist(&mut input)?;
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.account_holder_name.is_some() {
            sets.push("account_holder_name = $account_holder_name");
        }
        if input.bank_name.is_some() {
            sets.push("bank_name = $bank_name");
        }
        if input.branch_name.is_some() {
            sets.push("branch_name = $branch_name");
        }
        if input.ifsc.is_some() {
            sets.push("ifsc = $ifsc");
        }
        if input.account_number.is_some() {
            sets.push("account_number = $account_number");
        }
        if input.account_type.is_some() {
            sets.push("account_type = $account_type");
        }
        if input.currency.is_some() {
            sets.push("currency = $currency");
        }
        if input.is_primary.is_some() {
            sets.push("is_primary = $is_primary");
        }
        if input.verified.is_some() {
            sets.push("verified = $verified");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('bank_account', $id) SET {}; \
             SELECT meta::id(id) AS record_id, * FROM type::record('bank_account', $id);",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(v) = input.account_holder_name {
            builder = builder.bind(("account_holder_name", v));
        }
        if let Some(v) = input.bank_name {
            builder = builder.bind(("bank_name", v));
        }
        if let Some(v) = input.branch_name {
            builder = builder.bind(("branch_name", v));
        }
        if let Some(v) = input.ifsc {
            builder = builder.bind(("ifsc", v));
        }
        if let Some(v) = input.account_number {
            builder = builder.bind(("account_number", v));
        }
        if let Some(v) = input.account_type {
            builder = builder.bind(("account_type", account_type_to_string(v).to_string()));
        }
        if let Some(v) = input.currency {
            builder = builder.bind(("currency", v));
        }
        if let Some(v) = input.is_primary {
            builder = builder.bind(("is_primary", v));
        }
        if let Some(v) = input.verified {
            builder = builder.bind(("verified", v));
        }
        if let Some(v) = input.status {
            builder = builder.bind(("status", status_to_string(v).to_string()));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<BankAccountRow> = result.take(1).map_err(DbError::from)?;
        let account = self
            .decrypted(rows, input.tenant_context.as_ref())?
            .into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound {
                entity: "bank_account".into(),
                id: id_str,
            })?;

        Ok(account)
    }

    async fn delete(&self, id: Uuid) -> VaultResult<()> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id FROM type::record('bank_account', $id); \
                 DELETE type::record('bank_account', $id);",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let existing: Vec<IdRow> = result.take(0).map_err(DbError::from)?;
        if existing.is_empty() {
            return Err(DbError::NotFound {
                entity: "bank_account".into(),
                id: id_str,
            }
            .into());
        }

        Ok(())
    }
}
