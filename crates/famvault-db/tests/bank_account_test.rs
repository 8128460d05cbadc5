//! Integration tests for bank accounts using in-memory SurrealDB.

use std::sync::Arc;

use famvault_core::error::VaultError;
use famvault_core::guard::{TenantContext, TenantScoped};
use famvault_core::models::bank_account::{
    AccountStatus, AccountType, CreateBankAccount, UpdateBankAccount,
};
use famvault_core::repository::{BankAccountRepository, ReadOptions};
use famvault_crypto::{MasterKey, is_envelope};
use famvault_db::{MemoryConnector, TenantConnectionRegistry, TenantStore};
use surrealdb::engine::local::Db;
use uuid::Uuid;

const TENANT: &str = "731004";

async fn store() -> Arc<TenantStore<Db>> {
    let registry = TenantConnectionRegistry::new(
        MemoryConnector::default(),
        Arc::new(MasterKey::from_bytes([11u8; 32])),
    );
    registry.get_or_create_connection(TENANT).await.unwrap()
}

fn account(member_id: Uuid, number: &str) -> CreateBankAccount {
    let mut input = CreateBankAccount {
        member_id,
        account_holder_name: "Asha Sharma".into(),
        bank_name: "State Bank".into(),
        branch_name: Some("Kothrud".into()),
        ifsc: Some("SBIN0001234".into()),
        account_number: number.into(),
        account_type: AccountType::Savings,
        ..Default::default()
    };
    input.set_tenant_context(TENANT);
    input
}

#[tokio::test]
async fn create_encrypts_number_and_ifsc() {
    let store = store().await;
    let repo = store.bank_accounts();
    let member = Uuid::new_v4();

    let created = repo.create(account(member, "001122334455")).await.unwrap();
    assert_eq!(created.account_number, "001122334455");
    assert_eq!(created.ifsc.as_deref(), Some("SBIN0001234"));
    assert_eq!(created.currency, "INR");
    assert_eq!(created.status, AccountStatus::Active);
    assert!(!created.verified);
    assert_eq!(created.member_id, member);

    let raw = repo
        .get_by_id(created.id, &ReadOptions::default())
        .await
        .unwrap();
    assert!(is_envelope(&raw.account_number));
    assert!(is_envelope(raw.ifsc.as_deref().unwrap()));
    assert_eq!(raw.bank_name, "State Bank");
}

#[tokio::test]
async fn duplicate_account_number_conflicts() {
    let store = store().await;
    let repo = store.bank_accounts();
    let member = Uuid::new_v4();

    repo.create(account(member, "001122334455")).await.unwrap();
    let err = repo
        .create(account(Uuid::new_v4(), "001122334455"))
        .await
        .unwrap_err();
    assert!(
        matches!(&err, VaultError::Conflict { field, .. } if field == "account_number"),
        "unexpected error: {err:?}"
    );

    // A different number is fine.
    repo.create(account(member, "998877665544")).await.unwrap();
}

#[tokio::test]
async fn list_by_member_decrypts_with_context() {
    let store = store().await;
    let repo = store.bank_accounts();
    let asha = Uuid::new_v4();
    let ravi = Uuid::new_v4();

    repo.create(account(asha, "111")).await.unwrap();
    repo.create(account(asha, "222")).await.unwrap();
    repo.create(account(ravi, "333")).await.unwrap();

    let ctx = ReadOptions {
        tenant: Some(TenantContext::new(TENANT)),
    };
    let mut numbers: Vec<String> = repo
        .list_by_member(asha, &ctx)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.account_number)
        .collect();
    numbers.sort();
    assert_eq!(numbers, vec!["111", "222"]);

    let all = repo.list(&ReadOptions::default()).await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.iter().all(|a| is_envelope(&a.account_number)));
}

#[tokio::test]
async fn update_patch_and_delete() {
    let store = store().await;
    let repo = store.bank_accounts();
    let created = repo
        .create(account(Uuid::new_v4(), "001122334455"))
        .await
        .unwrap();

    let mut patch = UpdateBankAccount {
        ifsc: Some("HDFC0000001".into()),
        status: Some(AccountStatus::Closed),
        verified: Some(true),
        ..Default::default()
    };
    patch.set_tenant_context(TENANT);
    let updated = repo.update(created.id, patch).await.unwrap();
    assert_eq!(updated.ifsc.as_deref(), Some("HDFC0000001"));
    assert_eq!(updated.account_number, "001122334455");
    assert_eq!(updated.status, AccountStatus::Closed);
    assert!(updated.verified);

    let raw = repo
        .get_by_id(created.id, &ReadOptions::default())
        .await
        .unwrap();
    assert!(is_envelope(raw.ifsc.as_deref().unwrap()));

    repo.delete(created.id).await.unwrap();
    let err = repo.delete(created.id).await.unwrap_err();
    assert!(matches!(err, VaultError::NotFound { .. }));
}
