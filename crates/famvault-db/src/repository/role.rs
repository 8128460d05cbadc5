//! SurrealDB implementation of [`RoleRepository`].

use chrono::{DateTime, Utc};
use famvault_core::error::VaultResult;
use famvault_core::models::role::{CreateRole, ModulePermission, Role, UpdateRole};
use famvault_core::repository::RoleRepository;
use famvault_crypto::FieldGuard;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::{DbError, write_error};
use crate::registry::BoundCollection;

const UNIQUE_INDEXES: &[(&str, &str)] = &[("idx_role_name", "name")];

#[derive(Debug, SurrealValue)]
struct RoleRow {
    record_id: String,
    name: String,
    permissions: serde_json::Value,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRow {
    fn try_into_role(self) -> Result<Role, DbError> {
        let permissions: Vec<ModulePermission> = serde_json::from_value(self.permissions)
            .map_err(|e| DbError::Decode(format!("invalid role permissions: {e}")))?;
        Ok(Role {
            id: parse_uuid(&self.record_id, "role")?,
            name: self.name,
            permissions,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn permissions_value(permissions: &[ModulePermission]) -> Result<serde_json::Value, DbError> {
    serde_json::to_value(permissions)
        .map_err(|e| DbError::Query(format!("cannot encode role permissions: {e}")))
}

/// Roles of one tenant and the permission sets they grant.
#[derive(Clone)]
pub struct SurrealRoleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> BoundCollection<C> for SurrealRoleRepository<C> {
    const NAME: &'static str = "role";
    const ENCRYPTED_FIELDS: &'static [&'static str] = &[];

    fn bind(db: Surreal<C>, _guard: FieldGuard, _pepper: Option<String>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SurrealRoleRepository<C> {
    async fn select_all(&self, active_only: bool) -> Result<Vec<Role>, DbError> {
        let query = if active_only {
            "SELECT meta::id(id) AS record_id, * FROM role \
             WHERE is_active = true ORDER BY created_at DESC"
        } else {
            "SELECT meta::id(id) AS record_id, * FROM role ORDER BY created_at DESC"
        };

        let mut result = self.db.query(query).await?;
        let rows: Vec<RoleRow> = result.take(0)?;
        rows.into_iter().map(RoleRow::try_into_role).collect()
    }
}

impl<C: Connection> RoleRepository for SurrealRoleRepository<C> {
    async fn create(&self, input: CreateRole) -> VaultResult<Role> {
        let mut existing = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM role WHERE name = $name")
            .bind(("name", input.name.clone()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<RoleRow> = existing.take(0).map_err(DbError::from)?;
        if !rows.is_empty() {
            return Err(DbError::Conflict {
                entity: "role".into(),
                field: "name".into(),
            }
            .into());
        }

        let id_str = Uuid::new_v4().to_string();
        let permissions = permissions_value(&input.permissions)?;

        let result = self
            .db
            .query(
                "CREATE type::record('role', $id) SET \
                 name = $name, permissions = $permissions, is_active = true; \
                 SELECT meta::id(id) AS record_id, * FROM type::record('role', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("permissions", permissions))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| write_error(e, "role", UNIQUE_INDEXES))?;

        let rows: Vec<RoleRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id_str,
        })?;

        Ok(row.try_into_role()?)
    }

    async fn get_by_id(&self, id: Uuid) -> VaultResult<Role> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('role', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id_str,
        })?;

        Ok(row.try_into_role()?)
    }

    async fn find_active_by_name(&self, name: &str) -> VaultResult<Option<Role>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 WHERE name = $name AND is_active = true LIMIT 1",
            )
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(RoleRow::try_into_role)
            .transpose()?)
    }

    async fn list(&self) -> VaultResult<Vec<Role>> {
        Ok(self.select_all(false).await?)
    }

    async fn list_active(&self) -> VaultResult<Vec<Role>> {
        Ok(self.select_all(true).await?)
    }

    async fn update(&self, id: Uuid, input: UpdateRole) -> VaultResult<Role> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.permissions.is_some() {
            sets.push("permissions = $permissions");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('role', $id) SET {}; \
             SELECT meta::id(id) AS record_id, * FROM type::record('role', $id);",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(permissions) = input.permissions {
            builder = builder.bind(("permissions", permissions_value(&permissions)?));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| write_error(e, "role", UNIQUE_INDEXES))?;

        let rows: Vec<RoleRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id_str,
        })?;

        Ok(row.try_into_role()?)
    }

    async fn deactivate(&self, id: Uuid) -> VaultResult<Role> {
        self.update(
            id,
            UpdateRole {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
    }
}
