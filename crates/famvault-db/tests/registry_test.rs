//! Integration tests for the tenant connection registry using
//! in-memory SurrealDB.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use famvault_crypto::MasterKey;
use famvault_db::repository::SurrealFamilyMemberRepository;
use famvault_db::{DbError, MemoryConnector, StoreConnector, TenantConnectionRegistry};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tokio::task::JoinSet;

/// Memory connector that counts opens/closes, opens slowly enough for
/// callers to pile up, and can be told to fail.
#[derive(Clone, Default)]
struct CountingConnector {
    inner: MemoryConnector,
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    fail_next_open: Arc<AtomicBool>,
    fail_closes: Arc<AtomicBool>,
}

impl StoreConnector for CountingConnector {
    type Conn = Db;

    async fn open(&self, database: &str) -> Result<Surreal<Db>, DbError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(25)).await;
        if self.fail_next_open.swap(false, Ordering::SeqCst) {
            return Err(DbError::Query("store unavailable".into()));
        }
        self.inner.open(database).await
    }

    async fn close(&self, db: Surreal<Db>) -> Result<(), DbError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_closes.load(Ordering::SeqCst) {
            return Err(DbError::Query("close failed".into()));
        }
        self.inner.close(db).await
    }
}

fn master() -> Arc<MasterKey> {
    Arc::new(MasterKey::from_bytes([7u8; 32]))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_access_creates_one_store() {
    let connector = CountingConnector::default();
    let registry = Arc::new(TenantConnectionRegistry::new(connector.clone(), master()));

    let mut tasks = JoinSet::new();
    for _ in 0..16 {
        let registry = Arc::clone(&registry);
        tasks.spawn(async move { registry.get_or_create_connection("482913").await.unwrap() });
    }

    let mut stores = Vec::new();
    while let Some(store) = tasks.join_next().await {
        stores.push(store.unwrap());
    }

    assert_eq!(stores.len(), 16);
    for store in &stores[1..] {
        assert!(Arc::ptr_eq(&stores[0], store));
    }
    assert_eq!(connector.opens.load(Ordering::SeqCst), 1);
    assert_eq!(registry.stores_opened(), 1);
    assert_eq!(registry.len().await, 1);
}

#[tokio::test]
async fn store_is_bound_to_tenant_database() {
    let registry = TenantConnectionRegistry::new(MemoryConnector::default(), master());

    let store = registry.get_or_create_connection("482913").await.unwrap();
    assert_eq!(store.tenant_id(), "482913");
    assert_eq!(store.database(), "tenant_482913");
    assert_eq!(store.context().tenant_id(), "482913");

    let again = registry.get_or_create_connection("482913").await.unwrap();
    assert!(Arc::ptr_eq(&store, &again));
}

#[tokio::test]
async fn distinct_tenants_get_distinct_stores() {
    let registry = TenantConnectionRegistry::new(MemoryConnector::default(), master());

    let a = registry.get_or_create_connection("111111").await.unwrap();
    let b = registry.get_or_create_connection("222222").await.unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(registry.len().await, 2);
}

#[tokio::test]
async fn invalid_tenant_id_is_rejected() {
    let registry = TenantConnectionRegistry::new(MemoryConnector::default(), master());

    let result = registry.get_or_create_connection("").await;
    assert!(matches!(result, Err(DbError::InvalidTenantId(_))));

    let result = registry.get_or_create_connection("48 2913").await;
    assert!(matches!(result, Err(DbError::InvalidTenantId(_))));
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn failed_creation_is_retried_on_next_call() {
    let connector = CountingConnector::default();
    connector.fail_next_open.store(true, Ordering::SeqCst);
    let registry = TenantConnectionRegistry::new(connector.clone(), master());

    let first = registry.get_or_create_connection("482913").await;
    assert!(first.is_err());
    assert!(!registry.is_cached("482913").await);

    let second = registry.get_or_create_connection("482913").await;
    assert!(second.is_ok());
    assert!(registry.is_cached("482913").await);
    assert_eq!(connector.opens.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn close_connection_evicts_and_is_idempotent() {
    let connector = CountingConnector::default();
    let registry = TenantConnectionRegistry::new(connector.clone(), master());

    let first = registry.get_or_create_connection("482913").await.unwrap();
    registry.close_connection("482913").await.unwrap();
    assert!(!registry.is_cached("482913").await);
    assert_eq!(connector.closes.load(Ordering::SeqCst), 1);

    // Earlier handles report the close.
    assert!(first.is_closed());

    // Nothing cached: no-op.
    registry.close_connection("482913").await.unwrap();
    registry.close_connection("never-seen").await.unwrap();
    assert_eq!(connector.closes.load(Ordering::SeqCst), 1);

    // Reopening produces a fresh store.
    let second = registry.get_or_create_connection("482913").await.unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(connector.opens.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn close_during_open_never_leaks_a_store() {
    let connector = CountingConnector::default();
    let registry = Arc::new(TenantConnectionRegistry::new(connector.clone(), master()));

    let opening = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move { registry.get_or_create_connection("482913").await })
    };
    // Lands while the first open is still sleeping in the connector.
    tokio::time::sleep(Duration::from_millis(5)).await;
    registry.close_connection("482913").await.unwrap();

    match opening.await.unwrap() {
        Ok(store) => assert!(store.is_closed()),
        Err(e) => assert!(matches!(e, DbError::Closed(_))),
    }
    assert!(!registry.is_cached("482913").await);
    assert_eq!(
        connector.opens.load(Ordering::SeqCst),
        connector.closes.load(Ordering::SeqCst)
    );

    let reopened = registry.get_or_create_connection("482913").await.unwrap();
    assert!(!reopened.is_closed());

    registry.shutdown().await;
    assert!(reopened.is_closed());
    assert_eq!(connector.opens.load(Ordering::SeqCst), 2);
    assert_eq!(connector.closes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn shutdown_waits_for_stores_still_opening() {
    let connector = CountingConnector::default();
    let registry = Arc::new(TenantConnectionRegistry::new(connector.clone(), master()));

    let opening = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move { registry.get_or_create_connection("482913").await })
    };
    tokio::time::sleep(Duration::from_millis(5)).await;
    registry.shutdown().await;

    let _ = opening.await.unwrap();
    assert!(registry.is_empty().await);
    assert_eq!(
        connector.opens.load(Ordering::SeqCst),
        connector.closes.load(Ordering::SeqCst)
    );
}

#[tokio::test]
async fn shutdown_closes_everything_and_swallows_failures() {
    let connector = CountingConnector::default();
    let registry = TenantConnectionRegistry::new(connector.clone(), master());

    for tenant in ["111111", "222222", "333333"] {
        registry.get_or_create_connection(tenant).await.unwrap();
    }
    connector.fail_closes.store(true, Ordering::SeqCst);

    registry.shutdown().await;

    assert!(registry.is_empty().await);
    assert_eq!(connector.closes.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn collection_accessor_is_idempotent() {
    let registry = TenantConnectionRegistry::new(MemoryConnector::default(), master());
    let store = registry.get_or_create_connection("482913").await.unwrap();

    let a = store.family_members();
    let b = store.collection::<SurrealFamilyMemberRepository<Db>>();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(store.registered_collections(), 1);

    let _ = store.bank_accounts();
    let _ = store.bank_accounts();
    assert_eq!(store.registered_collections(), 2);
}
