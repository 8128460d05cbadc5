//! SurrealDB implementation of [`AdminUserRepository`].

use chrono::{DateTime, Utc};
use famvault_core::error::VaultResult;
use famvault_core::models::admin_user::{AdminUser, CreateAdminUser};
use famvault_core::repository::AdminUserRepository;
use famvault_crypto::FieldGuard;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::{DbError, write_error};
use crate::password::hash_password;
use crate::registry::BoundCollection;

const UNIQUE_INDEXES: &[(&str, &str)] = &[("idx_admin_user_username", "username")];

#[derive(Debug, SurrealValue)]
struct AdminUserRow {
    record_id: String,
    username: String,
    email: String,
    password_hash: String,
    roles: Vec<String>,
    created_at: DateTime<Utc>,
}

impl AdminUserRow {
    fn try_into_admin_user(self) -> Result<AdminUser, DbError> {
        Ok(AdminUser {
            id: parse_uuid(&self.record_id, "admin_user")?,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            roles: self.roles,
            created_at: self.created_at,
        })
    }
}

/// Administrative users of one tenant.
#[derive(Clone)]
pub struct SurrealAdminUserRepository<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for password hashing.
    pepper: Option<String>,
}

impl<C: Connection> BoundCollection<C> for SurrealAdminUserRepository<C> {
    const NAME: &'static str = "admin_user";
    const ENCRYPTED_FIELDS: &'static [&'static str] = &[];

    fn bind(db: Surreal<C>, _guard: FieldGuard, pepper: Option<String>) -> Self {
        Self { db, pepper }
    }
}

impl<C: Connection> AdminUserRepository for SurrealAdminUserRepository<C> {
    async fn create(&self, input: CreateAdminUser) -> VaultResult<AdminUser> {
        let id_str = Uuid::new_v4().to_string();
        let password_hash = hash_password(&input.password, self.pepper.as_deref())?;

        let result = self
            .db
            .query(
                "CREATE type::record('admin_user', $id) SET \
                 username = $username, email = $email, \
                 password_hash = $password_hash, roles = $roles; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('admin_user', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("username", input.username))
            .bind(("email", input.email))
            .bind(("password_hash", password_hash))
            .bind(("roles", input.roles))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| write_error(e, "admin_user", UNIQUE_INDEXES))?;

        let rows: Vec<AdminUserRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "admin_user".into(),
            id: id_str,
        })?;

        Ok(row.try_into_admin_user()?)
    }

    async fn get_by_id(&self, id: Uuid) -> VaultResult<AdminUser> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('admin_user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AdminUserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "admin_user".into(),
            id: id_str,
        })?;

        Ok(row.try_into_admin_user()?)
    }

    async fn find_by_username_or_email(
        &self,
        username_or_email: &str,
    ) -> VaultResult<Option<AdminUser>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM admin_user \
                 WHERE username = $login OR email = $login \
                 ORDER BY created_at ASC LIMIT 1",
            )
            .bind(("login", username_or_email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AdminUserRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(AdminUserRow::try_into_admin_user)
            .transpose()?)
    }
}
