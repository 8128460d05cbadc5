//! SurrealDB implementation of [`TenantDirectory`].

use chrono::{DateTime, Utc};
use famvault_core::error::VaultResult;
use famvault_core::models::tenant::{CreateTenant, Tenant};
use famvault_core::repository::{PaginatedResult, Pagination, TenantDirectory};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_uuid};
use crate::connection::StoreConnector;
use crate::error::{DbError, write_error};
use crate::schema::run_directory_migrations;

const UNIQUE_INDEXES: &[(&str, &str)] = &[
    ("idx_tenant_tenant_id", "tenant_id"),
    ("idx_tenant_email", "email"),
];

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct TenantRow {
    record_id: String,
    tenant_id: String,
    email: String,
    display_name: String,
    modules: Vec<String>,
    enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TenantRow {
    fn try_into_tenant(self) -> Result<Tenant, DbError> {
        Ok(Tenant {
            id: parse_uuid(&self.record_id, "tenant")?,
            tenant_id: self.tenant_id,
            email: self.email,
            display_name: self.display_name,
            modules: self.modules,
            enabled: self.enabled,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// The central tenant directory.
#[derive(Clone)]
pub struct SurrealTenantDirectory<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTenantDirectory<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Open the central `directory` database through `connector` and
    /// bring its schema up to date.
    pub async fn open<K>(connector: &K) -> Result<Self, DbError>
    where
        K: StoreConnector<Conn = C>,
    {
        let db = connector.open(crate::DIRECTORY_DATABASE).await?;
        run_directory_migrations(&db).await?;
        Ok(Self::new(db))
    }

    /// Returns a reference to the underlying SurrealDB client.
    pub fn client(&self) -> &Surreal<C> {
        &self.db
    }

    async fn find_one(&self, field: &'static str, value: &str) -> Result<Option<Tenant>, DbError> {
        let query =
            format!("SELECT meta::id(id) AS record_id, * FROM tenant WHERE {field} = $value");
        let mut result = self
            .db
            .query(query)
            .bind(("value", value.to_string()))
            .await?;

        let rows: Vec<TenantRow> = result.take(0)?;
        rows.into_iter().next().map(TenantRow::try_into_tenant).transpose()
    }
}

impl<C: Connection> TenantDirectory for SurrealTenantDirectory<C> {
    async fn create(&self, input: CreateTenant) -> VaultResult<Tenant> {
        let id_str = Uuid::new_v4().to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('tenant', $id) SET \
                 tenant_id = $tenant_id, email = $email, \
                 display_name = $display_name, modules = $modules, \
                 enabled = true; \
                 SELECT meta::id(id) AS record_id, * FROM type::record('tenant', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id))
            .bind(("email", input.email))
            .bind(("display_name", input.display_name))
            .bind(("modules", input.modules))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| write_error(e, "tenant", UNIQUE_INDEXES))?;

        let rows: Vec<TenantRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.try_into_tenant()?)
    }

    async fn get_by_tenant_id(&self, tenant_id: &str) -> VaultResult<Option<Tenant>> {
        Ok(self.find_one("tenant_id", tenant_id).await?)
    }

    async fn get_by_email(&self, email: &str) -> VaultResult<Option<Tenant>> {
        Ok(self.find_one("email", email).await?)
    }

    async fn set_enabled(&self, tenant_id: &str, enabled: bool) -> VaultResult<Tenant> {
        let result = self
            .db
            .query(
                "UPDATE tenant SET enabled = $enabled, updated_at = time::now() \
                 WHERE tenant_id = $tenant_id; \
                 SELECT meta::id(id) AS record_id, * FROM tenant \
                 WHERE tenant_id = $tenant_id;",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("enabled", enabled))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<TenantRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: tenant_id.to_string(),
        })?;

        Ok(row.try_into_tenant()?)
    }

    async fn update_modules(&self, tenant_id: &str, modules: Vec<String>) -> VaultResult<Tenant> {
        let result = self
            .db
            .query(
                "UPDATE tenant SET modules = $modules, updated_at = time::now() \
                 WHERE tenant_id = $tenant_id; \
                 SELECT meta::id(id) AS record_id, * FROM tenant \
                 WHERE tenant_id = $tenant_id;",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("modules", modules))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<TenantRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: tenant_id.to_string(),
        })?;

        Ok(row.try_into_tenant()?)
    }

    async fn list(&self, pagination: Pagination) -> VaultResult<PaginatedResult<Tenant>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM tenant GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM tenant \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(TenantRow::try_into_tenant)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
