//! Integration tests for family members and their encrypted fields
//! using in-memory SurrealDB.

use std::sync::Arc;

use chrono::NaiveDate;
use famvault_core::error::VaultError;
use famvault_core::models::family_member::{
    CreateFamilyMember, Gender, MaritalStatus, UpdateFamilyMember,
};
use famvault_core::repository::{FamilyMemberRepository, ReadOptions};
use famvault_crypto::{MasterKey, is_envelope};
use famvault_db::{MemoryConnector, TenantConnectionRegistry, TenantStore};
use surrealdb::engine::local::Db;

const TENANT: &str = "482913";

/// Helper: open a migrated tenant store on a fresh in-memory datastore.
async fn store() -> Arc<TenantStore<Db>> {
    let registry = TenantConnectionRegistry::new(
        MemoryConnector::default(),
        Arc::new(MasterKey::from_bytes([5u8; 32])),
    )
    .with_pepper("test-pepper");
    registry.get_or_create_connection(TENANT).await.unwrap()
}

fn asha() -> CreateFamilyMember {
    let mut input = CreateFamilyMember {
        name: "Asha".into(),
        gender: Some(Gender::Female),
        date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 2),
        contact_number: Some("9876543210".into()),
        email: "asha@example.com".into(),
        address: Some("12 MG Road, Pune".into()),
        relation: Some("Daughter".into()),
        marital_status: Some(MaritalStatus::Single),
        income: Some(125000.5),
        ..Default::default()
    };
    input.tenant_context = Some(famvault_core::guard::TenantContext::new(TENANT));
    input
}

#[tokio::test]
async fn create_returns_plaintext_and_stores_ciphertext() {
    let store = store().await;
    let repo = store.family_members();

    let member = repo.create(asha()).await.unwrap();
    assert_eq!(member.contact_number.as_deref(), Some("9876543210"));
    assert_eq!(member.address.as_deref(), Some("12 MG Road, Pune"));
    assert_eq!(member.gender, Some(Gender::Female));
    assert_eq!(member.date_of_birth, NaiveDate::from_ymd_opt(1990, 5, 2));
    assert_eq!(member.income, Some(125000.5));
    assert!(member.password_hash.is_none());

    // Reading without a tenant context returns exactly what is stored.
    let raw = repo
        .get_by_id(member.id, &ReadOptions::default())
        .await
        .unwrap();
    assert!(is_envelope(raw.contact_number.as_deref().unwrap()));
    assert!(is_envelope(raw.address.as_deref().unwrap()));
    assert_eq!(raw.name, "Asha");
    assert_eq!(raw.email, "asha@example.com");

    let decrypted = repo
        .get_by_id(member.id, &ReadOptions::for_tenant(TENANT))
        .await
        .unwrap();
    assert_eq!(decrypted.contact_number.as_deref(), Some("9876543210"));
    assert_eq!(decrypted.address.as_deref(), Some("12 MG Road, Pune"));
}

#[tokio::test]
async fn create_without_context_stores_plaintext() {
    let store = store().await;
    let repo = store.family_members();

    let mut input = asha();
    input.tenant_context = None;
    let member = repo.create(input).await.unwrap();

    let raw = repo
        .get_by_id(member.id, &ReadOptions::default())
        .await
        .unwrap();
    assert_eq!(raw.contact_number.as_deref(), Some("9876543210"));
}

#[tokio::test]
async fn other_tenant_context_cannot_decrypt() {
    let store = store().await;
    let repo = store.family_members();
    let member = repo.create(asha()).await.unwrap();

    let read = repo
        .get_by_id(member.id, &ReadOptions::for_tenant("111111"))
        .await
        .unwrap();
    assert!(is_envelope(read.contact_number.as_deref().unwrap()));
}

#[tokio::test]
async fn find_by_email_and_list() {
    let store = store().await;
    let repo = store.family_members();
    repo.create(asha()).await.unwrap();
    repo.create(CreateFamilyMember {
        name: "Ravi".into(),
        email: "ravi@example.com".into(),
        ..Default::default()
    })
    .await
    .unwrap();

    let found = repo
        .find_by_email("asha@example.com", &ReadOptions::for_tenant(TENANT))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.contact_number.as_deref(), Some("9876543210"));

    assert!(
        repo.find_by_email("nobody@example.com", &ReadOptions::default())
            .await
            .unwrap()
            .is_none()
    );

    let all = repo.list(&ReadOptions::for_tenant(TENANT)).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let store = store().await;
    let repo = store.family_members();
    repo.create(asha()).await.unwrap();

    let err = repo.create(asha()).await.unwrap_err();
    assert!(
        matches!(&err, VaultError::Conflict { entity, field } if entity == "family_member" && field == "email"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn password_is_hashed() {
    let store = store().await;
    let repo = store.family_members();

    let mut input = asha();
    input.password = Some("hunter22".into());
    let member = repo.create(input).await.unwrap();

    let hash = member.password_hash.unwrap();
    assert!(hash.starts_with("$argon2id$"));
    assert!(!hash.contains("hunter22"));
}

#[tokio::test]
async fn update_reencrypts_modified_fields_only() {
    let store = store().await;
    let repo = store.family_members();
    let member = repo.create(asha()).await.unwrap();

    let before = repo
        .get_by_id(member.id, &ReadOptions::default())
        .await
        .unwrap();

    let mut patch = UpdateFamilyMember {
        contact_number: Some("9000000001".into()),
        occupation: Some("Engineer".into()),
        ..Default::default()
    };
    patch.tenant_context = Some(store.context());
    let updated = repo.update(member.id, patch).await.unwrap();
    assert_eq!(updated.contact_number.as_deref(), Some("9000000001"));
    assert_eq!(updated.occupation.as_deref(), Some("Engineer"));
    assert_eq!(updated.address.as_deref(), Some("12 MG Road, Pune"));

    let after = repo
        .get_by_id(member.id, &ReadOptions::default())
        .await
        .unwrap();
    assert!(is_envelope(after.contact_number.as_deref().unwrap()));
    assert_ne!(after.contact_number, before.contact_number);
    // Untouched guarded field keeps its stored ciphertext.
    assert_eq!(after.address, before.address);
}

#[tokio::test]
async fn missing_member_is_not_found() {
    let store = store().await;
    let repo = store.family_members();
    let id = uuid::Uuid::new_v4();

    let err = repo
        .get_by_id(id, &ReadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::NotFound { .. }));

    let err = repo
        .update(id, UpdateFamilyMember::default())
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::NotFound { .. }));

    let err = repo.delete(id).await.unwrap_err();
    assert!(matches!(err, VaultError::NotFound { .. }));
}

#[tokio::test]
async fn delete_removes_member() {
    let store = store().await;
    let repo = store.family_members();
    let member = repo.create(asha()).await.unwrap();

    repo.delete(member.id).await.unwrap();
    let err = repo
        .get_by_id(member.id, &ReadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::NotFound { .. }));
}
