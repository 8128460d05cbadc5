//! Tenant connection registry.
//!
//! Owns the mapping from tenant id to the live handle on that tenant's
//! isolated database (`tenant_<id>`). Each tenant id maps to a slot
//! holding a [`OnceCell`]; the first caller runs the creation inside
//! the cell and concurrent callers for the same tenant wait on that same
//! creation instead of starting their own. A failed creation leaves the
//! cell empty so the next caller retries.
//!
//! The registry is an ordinary value: build one at startup, share it
//! behind an `Arc`, and call [`TenantConnectionRegistry::shutdown`]
//! before exit.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use famvault_core::guard::TenantContext;
use famvault_crypto::{FieldGuard, MasterKey};
use surrealdb::{Connection, Surreal};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::connection::StoreConnector;
use crate::error::DbError;
use crate::repository::{
    SurrealAdminUserRepository, SurrealBankAccountRepository, SurrealFamilyMemberRepository,
    SurrealRoleRepository,
};
use crate::schema::run_tenant_migrations;

/// Name of the database holding `tenant_id`'s data.
pub fn tenant_database_name(tenant_id: &str) -> String {
    format!("tenant_{tenant_id}")
}

fn validate_tenant_id(tenant_id: &str) -> Result<(), DbError> {
    let valid = !tenant_id.is_empty()
        && tenant_id.len() <= 64
        && tenant_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(DbError::InvalidTenantId(tenant_id.to_owned()))
    }
}

/// A repository that can be bound to a tenant store.
///
/// Implementors declare which of their fields are encrypted; the store
/// builds the matching [`FieldGuard`] when the collection is first
/// requested. `pepper` is the server-side secret mixed into password
/// hashes, for collections that store credentials.
pub trait BoundCollection<C: Connection>: Send + Sync + 'static {
    /// Collection (table) name, for logging.
    const NAME: &'static str;
    /// Fields encrypted with the tenant key.
    const ENCRYPTED_FIELDS: &'static [&'static str];

    fn bind(db: Surreal<C>, guard: FieldGuard, pepper: Option<String>) -> Self;
}

/// Live handle on one tenant's database.
pub struct TenantStore<C: Connection> {
    tenant_id: String,
    database: String,
    db: Surreal<C>,
    master: Arc<MasterKey>,
    pepper: Option<String>,
    collections: Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
    closed: AtomicBool,
}

impl<C: Connection> TenantStore<C> {
    fn new(
        tenant_id: String,
        database: String,
        db: Surreal<C>,
        master: Arc<MasterKey>,
        pepper: Option<String>,
    ) -> Self {
        Self {
            tenant_id,
            database,
            db,
            master,
            pepper,
            collections: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Whether the registry has closed this store's client.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Flag the store closed. True only for the first caller.
    fn mark_closed(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Tenant context for stamping writes and reads against this store.
    pub fn context(&self) -> TenantContext {
        TenantContext::new(self.tenant_id.clone())
    }

    /// Returns a reference to the underlying SurrealDB client.
    pub fn client(&self) -> &Surreal<C> {
        &self.db
    }

    /// The repository `R` bound to this store, with its field guard
    /// attached. The first call registers it; every later call returns
    /// the same instance.
    pub fn collection<R: BoundCollection<C>>(&self) -> Arc<R> {
        let mut collections = self
            .collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = collections.get(&TypeId::of::<R>()) {
            if let Ok(bound) = Arc::clone(existing).downcast::<R>() {
                return bound;
            }
        }

        debug!(
            tenant_id = %self.tenant_id,
            collection = R::NAME,
            encrypted_fields = ?R::ENCRYPTED_FIELDS,
            "Registering collection"
        );
        let guard = FieldGuard::new(Arc::clone(&self.master), R::ENCRYPTED_FIELDS);
        let bound = Arc::new(R::bind(self.db.clone(), guard, self.pepper.clone()));
        collections.insert(TypeId::of::<R>(), bound.clone());
        bound
    }

    /// Number of distinct collections registered so far.
    pub fn registered_collections(&self) -> usize {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn admin_users(&self) -> Arc<SurrealAdminUserRepository<C>> {
        self.collection()
    }

    pub fn family_members(&self) -> Arc<SurrealFamilyMemberRepository<C>> {
        self.collection()
    }

    pub fn bank_accounts(&self) -> Arc<SurrealBankAccountRepository<C>> {
        self.collection()
    }

    pub fn roles(&self) -> Arc<SurrealRoleRepository<C>> {
        self.collection()
    }
}

impl<C: Connection> std::fmt::Debug for TenantStore<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantStore")
            .field("tenant_id", &self.tenant_id)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

type Slot<C> = Arc<OnceCell<Arc<TenantStore<C>>>>;

/// Creates, caches and tears down one [`TenantStore`] per tenant.
pub struct TenantConnectionRegistry<K: StoreConnector> {
    connector: K,
    master: Arc<MasterKey>,
    pepper: Option<String>,
    slots: tokio::sync::Mutex<HashMap<String, Slot<K::Conn>>>,
    opened: AtomicU64,
}

impl<K: StoreConnector> TenantConnectionRegistry<K> {
    pub fn new(connector: K, master: Arc<MasterKey>) -> Self {
        Self {
            connector,
            master,
            pepper: None,
            slots: tokio::sync::Mutex::new(HashMap::new()),
            opened: AtomicU64::new(0),
        }
    }

    /// Hash member and admin passwords with `pepper` prepended.
    pub fn with_pepper(mut self, pepper: impl Into<String>) -> Self {
        self.pepper = Some(pepper.into());
        self
    }

    pub fn connector(&self) -> &K {
        &self.connector
    }

    /// Return the cached store for `tenant_id`, opening and migrating it
    /// on first access.
    pub async fn get_or_create_connection(
        &self,
        tenant_id: &str,
    ) -> Result<Arc<TenantStore<K::Conn>>, DbError> {
        validate_tenant_id(tenant_id)?;

        let slot = {
            let mut slots = self.slots.lock().await;
            Arc::clone(slots.entry(tenant_id.to_owned()).or_default())
        };

        let store = match slot.get() {
            Some(store) => {
                debug!(tenant_id, "Tenant store cache hit");
                Arc::clone(store)
            }
            None => Arc::clone(slot.get_or_try_init(|| self.open_store(tenant_id)).await?),
        };

        // The slot may have been evicted while the store was opening.
        let tracked = self
            .slots
            .lock()
            .await
            .get(tenant_id)
            .is_some_and(|current| Arc::ptr_eq(current, &slot));
        if !tracked {
            self.close_store(&store).await?;
            return Err(DbError::Closed(tenant_id.to_owned()));
        }

        Ok(store)
    }

    async fn open_store(&self, tenant_id: &str) -> Result<Arc<TenantStore<K::Conn>>, DbError> {
        let database = tenant_database_name(tenant_id);
        info!(tenant_id, database = %database, "Creating tenant store");

        let db = self.connector.open(&database).await?;
        run_tenant_migrations(&db).await?;
        self.opened.fetch_add(1, Ordering::Relaxed);

        Ok(Arc::new(TenantStore::new(
            tenant_id.to_owned(),
            database,
            db,
            Arc::clone(&self.master),
            self.pepper.clone(),
        )))
    }

    /// Wait out any creation in flight on `slot` and return its store.
    /// `None` when the slot never produced one.
    async fn settle(slot: &Slot<K::Conn>) -> Option<Arc<TenantStore<K::Conn>>> {
        slot.get_or_try_init(|| async { Err(DbError::Query("no store to settle".into())) })
            .await
            .ok()
            .map(Arc::clone)
    }

    async fn close_store(&self, store: &TenantStore<K::Conn>) -> Result<(), DbError> {
        if !store.mark_closed() {
            return Ok(());
        }
        info!(
            tenant_id = %store.tenant_id(),
            database = %store.database(),
            "Closing tenant store"
        );
        self.connector.close(store.client().clone()).await
    }

    /// Close and evict the store for `tenant_id`, waiting for a creation
    /// that is still in flight. No-op when nothing is cached.
    ///
    /// Handles obtained earlier must not be used afterwards: the
    /// connector closes the shared client, and a remote client is
    /// signed out. [`TenantStore::is_closed`] reports this.
    pub async fn close_connection(&self, tenant_id: &str) -> Result<(), DbError> {
        let Some(slot) = self.slots.lock().await.remove(tenant_id) else {
            return Ok(());
        };
        let Some(store) = Self::settle(&slot).await else {
            return Ok(());
        };
        self.close_store(&store).await
    }

    /// Close every cached store. Individual close failures are logged
    /// and skipped so shutdown always completes.
    pub async fn shutdown(&self) {
        let slots: Vec<(String, Slot<K::Conn>)> = self.slots.lock().await.drain().collect();

        let mut closed = 0usize;
        for (tenant_id, slot) in slots {
            let Some(store) = Self::settle(&slot).await else {
                continue;
            };
            match self.close_store(&store).await {
                Ok(()) => closed += 1,
                Err(e) => warn!(tenant_id = %tenant_id, error = %e, "Failed to close tenant store"),
            }
        }

        info!(closed, "Tenant connection registry shut down");
    }

    /// Whether a live store is cached for `tenant_id`.
    pub async fn is_cached(&self, tenant_id: &str) -> bool {
        self.slots
            .lock()
            .await
            .get(tenant_id)
            .is_some_and(|slot| slot.initialized())
    }

    /// Number of live cached stores.
    pub async fn len(&self) -> usize {
        self.slots
            .lock()
            .await
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Total stores opened over the registry's lifetime.
    pub fn stores_opened(&self) -> u64 {
        self.opened.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_name_is_prefixed() {
        assert_eq!(tenant_database_name("482913"), "tenant_482913");
    }

    #[test]
    fn tenant_ids_are_validated() {
        assert!(validate_tenant_id("482913").is_ok());
        assert!(validate_tenant_id("acme-prod_1").is_ok());
        assert!(validate_tenant_id("").is_err());
        assert!(validate_tenant_id("a;DROP").is_err());
        assert!(validate_tenant_id("with space").is_err());
        assert!(validate_tenant_id(&"9".repeat(65)).is_err());
    }
}
