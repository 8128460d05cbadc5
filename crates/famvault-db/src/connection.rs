//! SurrealDB store connectors.
//!
//! A [`StoreConnector`] knows how to open a handle onto one named
//! database and how to release it. The tenant registry and the tenant
//! directory are both built on top of a connector, so the same code
//! runs against a remote server or the embedded in-memory engine.

use surrealdb::engine::local::{Db, Mem};
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use surrealdb::{Connection, Surreal};
use tracing::info;

use crate::error::DbError;

/// Configuration for connecting to SurrealDB.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// WebSocket URL (e.g., `127.0.0.1:8000`).
    pub url: String,
    /// SurrealDB namespace shared by the directory and all tenant stores.
    pub namespace: String,
    /// Root username for authentication.
    pub username: String,
    /// Root password for authentication.
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "famvault".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

/// Opens and closes handles onto named databases.
pub trait StoreConnector: Send + Sync + 'static {
    type Conn: Connection;

    /// Open a handle with the configured namespace and `database`
    /// selected.
    fn open(&self, database: &str) -> impl Future<Output = Result<Surreal<Self::Conn>, DbError>> + Send;

    /// Release a handle previously returned by [`open`](Self::open).
    /// Clones of `db` share its session and may stop working.
    fn close(&self, db: Surreal<Self::Conn>) -> impl Future<Output = Result<(), DbError>> + Send;
}

/// Connects to a SurrealDB server over WebSocket.
#[derive(Debug, Clone)]
pub struct RemoteConnector {
    config: DbConfig,
}

impl RemoteConnector {
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }
}

impl StoreConnector for RemoteConnector {
    type Conn = Client;

    async fn open(&self, database: &str) -> Result<Surreal<Client>, DbError> {
        info!(
            url = %self.config.url,
            namespace = %self.config.namespace,
            database = %database,
            "Connecting to SurrealDB"
        );

        let db = Surreal::new::<Ws>(&self.config.url).await?;

        db.signin(Root {
            username: self.config.username.clone(),
            password: self.config.password.clone(),
        })
        .await?;

        db.use_ns(&self.config.namespace).use_db(database).await?;

        info!(database = %database, "Successfully connected to SurrealDB");

        Ok(db)
    }

    async fn close(&self, db: Surreal<Client>) -> Result<(), DbError> {
        db.invalidate().await?;
        Ok(())
    }
}

/// Embedded in-memory engine. Every [`open`](StoreConnector::open)
/// starts a fresh, independent datastore, which gives each tenant
/// complete isolation without a server.
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    namespace: String,
}

impl MemoryConnector {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new("famvault")
    }
}

impl StoreConnector for MemoryConnector {
    type Conn = Db;

    async fn open(&self, database: &str) -> Result<Surreal<Db>, DbError> {
        let db = Surreal::new::<Mem>(()).await?;
        db.use_ns(&self.namespace).use_db(database).await?;
        info!(database = %database, "Opened in-memory store");
        Ok(db)
    }

    async fn close(&self, db: Surreal<Db>) -> Result<(), DbError> {
        drop(db);
        Ok(())
    }
}
