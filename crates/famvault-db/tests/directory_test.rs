//! Integration tests for the tenant directory and tenant provisioning
//! using in-memory SurrealDB.

use std::sync::Arc;

use famvault_core::error::VaultError;
use famvault_core::models::tenant::{CreateTenant, DEFAULT_MODULES};
use famvault_core::repository::{AdminUserRepository, Pagination, TenantDirectory};
use famvault_crypto::MasterKey;
use famvault_db::repository::SurrealTenantDirectory;
use famvault_db::{MemoryConnector, ProvisionTenant, TenantConnectionRegistry, TenantProvisioner};
use surrealdb::engine::local::Db;

/// Helper: open the directory on a fresh in-memory datastore.
async fn directory() -> SurrealTenantDirectory<Db> {
    SurrealTenantDirectory::open(&MemoryConnector::default())
        .await
        .unwrap()
}

fn create_input(tenant_id: &str, email: &str) -> CreateTenant {
    CreateTenant {
        tenant_id: tenant_id.into(),
        email: email.into(),
        display_name: "The Sharmas".into(),
        modules: vec!["family".into(), "documents".into()],
    }
}

/// Helper: directory + registry + provisioner sharing them.
async fn setup_provisioning() -> (
    Arc<SurrealTenantDirectory<Db>>,
    Arc<TenantConnectionRegistry<MemoryConnector>>,
    TenantProvisioner<SurrealTenantDirectory<Db>, MemoryConnector>,
) {
    let directory = Arc::new(directory().await);
    let registry = Arc::new(TenantConnectionRegistry::new(
        MemoryConnector::default(),
        Arc::new(MasterKey::from_bytes([3u8; 32])),
    ));
    let provisioner = TenantProvisioner::new(Arc::clone(&directory), Arc::clone(&registry));
    (directory, registry, provisioner)
}

// -----------------------------------------------------------------------
// Directory
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_and_lookup_tenant() {
    let dir = directory().await;

    let tenant = dir
        .create(create_input("482913", "owner@sharma.example"))
        .await
        .unwrap();
    assert_eq!(tenant.tenant_id, "482913");
    assert!(tenant.enabled);
    assert_eq!(tenant.modules, vec!["family", "documents"]);

    let by_id = dir.get_by_tenant_id("482913").await.unwrap().unwrap();
    assert_eq!(by_id.id, tenant.id);

    let by_email = dir
        .get_by_email("owner@sharma.example")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_email.tenant_id, "482913");
}

#[tokio::test]
async fn unknown_tenant_is_none() {
    let dir = directory().await;
    assert!(dir.get_by_tenant_id("000000").await.unwrap().is_none());
    assert!(dir.get_by_email("nobody@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_tenant_id_or_email_conflicts() {
    let dir = directory().await;
    dir.create(create_input("482913", "a@example.com"))
        .await
        .unwrap();

    let err = dir
        .create(create_input("482913", "b@example.com"))
        .await
        .unwrap_err();
    assert!(
        matches!(&err, VaultError::Conflict { entity, field } if entity == "tenant" && field == "tenant_id"),
        "unexpected error: {err:?}"
    );

    let err = dir
        .create(create_input("555555", "a@example.com"))
        .await
        .unwrap_err();
    assert!(
        matches!(&err, VaultError::Conflict { field, .. } if field == "email"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn disable_and_update_modules() {
    let dir = directory().await;
    dir.create(create_input("482913", "a@example.com"))
        .await
        .unwrap();

    let disabled = dir.set_enabled("482913", false).await.unwrap();
    assert!(!disabled.enabled);

    let updated = dir
        .update_modules("482913", vec!["loan".into()])
        .await
        .unwrap();
    assert_eq!(updated.modules, vec!["loan"]);
    assert!(!updated.enabled);

    let err = dir.set_enabled("999999", true).await.unwrap_err();
    assert!(matches!(err, VaultError::NotFound { .. }));
}

#[tokio::test]
async fn list_is_paginated() {
    let dir = directory().await;
    for (i, id) in ["100001", "100002", "100003"].iter().enumerate() {
        dir.create(create_input(id, &format!("t{i}@example.com")))
            .await
            .unwrap();
    }

    let page = dir
        .list(Pagination {
            offset: 0,
            limit: 2,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);

    let rest = dir
        .list(Pagination {
            offset: 2,
            limit: 2,
        })
        .await
        .unwrap();
    assert_eq!(rest.items.len(), 1);
}

// -----------------------------------------------------------------------
// Provisioning
// -----------------------------------------------------------------------

#[tokio::test]
async fn provision_creates_tenant_and_seeds_admin() {
    let (dir, registry, provisioner) = setup_provisioning().await;

    let provisioned = provisioner
        .provision(ProvisionTenant {
            email: "alice@example.com".into(),
            username: "alice".into(),
            password: "secret".into(),
            display_name: None,
        })
        .await
        .unwrap();

    let tenant = &provisioned.tenant;
    assert_eq!(tenant.tenant_id.len(), 6);
    assert_eq!(tenant.display_name, "alice");
    assert_eq!(tenant.modules, DEFAULT_MODULES);
    assert!(tenant.enabled);
    assert_eq!(provisioned.admin.roles, vec!["admin"]);
    assert!(provisioned.admin.password_hash.starts_with("$argon2id$"));

    assert!(dir.get_by_tenant_id(&tenant.tenant_id).await.unwrap().is_some());
    assert!(registry.is_cached(&tenant.tenant_id).await);

    let store = registry
        .get_or_create_connection(&tenant.tenant_id)
        .await
        .unwrap();
    let admin = store
        .admin_users()
        .find_by_username_or_email("alice")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(admin.id, provisioned.admin.id);
}

#[tokio::test]
async fn provision_rejects_duplicate_email() {
    let (_dir, _registry, provisioner) = setup_provisioning().await;
    let input = ProvisionTenant {
        email: "alice@example.com".into(),
        username: "alice".into(),
        password: "secret".into(),
        display_name: Some("Alice's family".into()),
    };

    provisioner.provision(input.clone()).await.unwrap();
    let err = provisioner.provision(input).await.unwrap_err();
    assert!(
        matches!(&err, VaultError::Conflict { field, .. } if field == "email"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn provision_requires_credentials() {
    let (_dir, _registry, provisioner) = setup_provisioning().await;
    let err = provisioner
        .provision(ProvisionTenant {
            email: "alice@example.com".into(),
            username: " ".into(),
            password: "secret".into(),
            display_name: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::Validation { .. }));
}

#[tokio::test]
async fn offboard_disables_and_closes() {
    let (dir, registry, provisioner) = setup_provisioning().await;
    let provisioned = provisioner
        .provision(ProvisionTenant {
            email: "alice@example.com".into(),
            username: "alice".into(),
            password: "secret".into(),
            display_name: None,
        })
        .await
        .unwrap();
    let tenant_id = provisioned.tenant.tenant_id;

    let tenant = provisioner.offboard(&tenant_id).await.unwrap();
    assert!(!tenant.enabled);
    assert!(!registry.is_cached(&tenant_id).await);
    assert!(
        !dir.get_by_tenant_id(&tenant_id)
            .await
            .unwrap()
            .unwrap()
            .enabled
    );
}
