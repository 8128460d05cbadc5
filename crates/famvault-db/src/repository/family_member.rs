//! SurrealDB implementation of [`FamilyMemberRepository`].
//!
//! `contact_number` and `address` pass through the collection's
//! [`FieldGuard`]: encrypted before every write that carries a tenant
//! context, decrypted after every read whose options carry one.
//! `date_of_birth` is stored as an ISO `YYYY-MM-DD` string.

use chrono::{DateTime, NaiveDate, Utc};
use famvault_core::error::VaultResult;
use famvault_core::guard::TenantContext;
use famvault_core::models::family_member::{
    CreateFamilyMember, FamilyMember, Gender, MaritalStatus, UpdateFamilyMember,
};
use famvault_core::repository::{FamilyMemberRepository, ReadOptions};
use famvault_crypto::FieldGuard;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{IdRow, parse_uuid};
use crate::error::{DbError, write_error};
use crate::password::hash_password;
use crate::registry::BoundCollection;

const UNIQUE_INDEXES: &[(&str, &str)] = &[("idx_family_member_email", "email")];
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, SurrealValue)]
struct FamilyMemberRow {
    record_id: String,
    name: String,
    gender: Option<String>,
    date_of_birth: Option<String>,
    contact_number: Option<String>,
    email: String,
    address: Option<String>,
    relation: Option<String>,
    occupation: Option<String>,
    education: Option<String>,
    marital_status: Option<String>,
    income: Option<f64>,
    password_hash: Option<String>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl FamilyMemberRow {
    fn try_into_member(self) -> Result<FamilyMember, DbError> {
        let date_of_birth = self
            .date_of_birth
            .as_deref()
            .map(|d| {
                NaiveDate::parse_from_str(d, DATE_FORMAT)
                    .map_err(|e| DbError::Decode(format!("invalid date_of_birth {d:?}: {e}")))
            })
            .transpose()?;

        Ok(FamilyMember {
            id: parse_uuid(&self.record_id, "family_member")?,
            name: self.name,
            gender: self.gender.as_deref().map(parse_gender).transpose()?,
            date_of_birth,
            contact_number: self.contact_number,
            email: self.email,
            address: self.address,
            relation: self.relation,
            occupation: self.occupation,
            education: self.education,
            marital_status: self
                .marital_status
                .as_deref()
                .map(parse_marital_status)
                .transpose()?,
            income: self.income,
            password_hash: self.password_hash,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn parse_gender(s: &str) -> Result<Gender, DbError> {
    match s {
        "Male" => Ok(Gender::Male),
        "Female" => Ok(Gender::Female),
        "Other" => Ok(Gender::Other),
        other => Err(DbError::Decode(format!("unknown gender: {other}"))),
    }
}

fn gender_to_string(g: Gender) -> &'static str {
    match g {
        Gender::Male => "Male",
        Gender::Female => "Female",
        Gender::Other => "Other",
    }
}

fn parse_marital_status(s: &str) -> Result<MaritalStatus, DbError> {
    match s {
        "Single" => Ok(MaritalStatus::Single),
        "Married" => Ok(MaritalStatus::Married),
        "Widowed" => Ok(MaritalStatus::Widowed),
        "Divorced" => Ok(MaritalStatus::Divorced),
        other => Err(DbError::Decode(format!("unknown marital status: {other}"))),
    }
}

fn marital_status_to_string(m: MaritalStatus) -> &'static str {
    match m {
        MaritalStatus::Single => "Single",
        MaritalStatus::Married => "Married",
        MaritalStatus::Widowed => "Widowed",
        MaritalStatus::Divorced => "Divorced",
    }
}

/// Family members of one tenant.
#[derive(Clone)]
pub struct SurrealFamilyMemberRepository<C: Connection> {
    db: Surreal<C>,
    guard: FieldGuard,
    pepper: Option<String>,
}

impl<C: Connection> BoundCollection<C> for SurrealFamilyMemberRepository<C> {
    const NAME: &'static str = "family_member";
    const ENCRYPTED_FIELDS: &'static [&'static str] =
        famvault_core::models::family_member::ENCRYPTED_FIELDS;

    fn bind(db: Surreal<C>, guard: FieldGuard, pepper: Option<String>) -> Self {
        Self { db, guard, pepper }
    }
}

impl<C: Connection> SurrealFamilyMemberRepository<C> {
    fn hash(&self, password: Option<&str>) -> Result<Option<String>, DbError> {
        password
            .filter(|p| !p.trim().is_empty())
            .map(|p| hash_password(p, self.pepper.as_deref()))
            .transpose()
    }

    fn decrypted(
        &self,
        rows: Vec<FamilyMemberRow>,
        context: Option<&TenantContext>,
    ) -> Result<Vec<FamilyMember>, DbError> {
        let mut members = rows
            .into_iter()
            .map(FamilyMemberRow::try_into_member)
            .collect::<Result<Vec<_>, DbError>>()?;
        self.guard.after_load(&mut members, context);
        Ok(members)
    }
}

impl<C: Connection> FamilyMemberRepository for SurrealFamilyMemberRepository<C> {
    async fn create(&self, mut input: CreateFamilyMember) -> VaultResult<FamilyMember> {
        self.guard.before_persist(&mut input)?;
        let password_hash = self.hash(input.password.as_deref())?;

        let id_str = Uuid::new_v4().to_string();
        let metadata = input
            .metadata
            .unwrap_or(serde_json::Value::Object(Default::default()));

        let result = self
            .db
            .query(
                "CREATE type::record('family_member', $id) SET \
                 name = $name, gender = $gender, \
                 date_of_birth = $date_of_birth, \
                 contact_number = $contact_number, email = $email, \
                 address = $address, relation = $relation, \
                 occupation = $occupation, education = $education, \
                 marital_status = $marital_status, income = $income, \
                 password_hash = $password_hash, metadata = $metadata; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('family_member', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("gender", input.gender.map(|g| gender_to_string(g).to_string())))
            .bind((
                "date_of_birth",
                input.date_of_birth.map(|d| d.format(DATE_FORMAT).to_string()),
            ))
            .bind(("contact_number", input.contact_number))
            .bind(("email", input.email))
            .bind(("address", input.address))
            .bind(("relation", input.relation))
            .bind(("occupation", input.occupation))
            .bind(("education", input.education))
            .bind((
                "marital_status",
                input
                    .marital_status
                    .map(|m| marital_status_to_string(m).to_string()),
            ))
            .bind(("income", input.income))
            .bind(("password_hash", password_hash))
            .bind(("metadata", metadata))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| write_error(e, "family_member", UNIQUE_INDEXES))?;

        let rows: Vec<FamilyMemberRow> = result.take(1).map_err(DbError::from)?;
        let member = self
            .decrypted(rows, input.tenant_context.as_ref())?
            .into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound {
                entity: "family_member".into(),
                id: id_str,
            })?;

        Ok(member)
    }

    async fn get_by_id(&self, id: Uuid, options: &ReadOptions) -> VaultResult<FamilyMember> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('family_member', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<FamilyMemberRow> = result.take(0).map_err(DbError::from)?;
        let member = self
            .decrypted(rows, options.tenant.as_ref())?
            .into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound {
                entity: "family_member".into(),
                id: id_str,
            })?;

        Ok(member)
    }

    async fn find_by_email(
        &self,
        email: &str,
        options: &ReadOptions,
    ) -> VaultResult<Option<FamilyMember>> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM family_member WHERE email = $email")
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<FamilyMemberRow> = result.take(0).map_err(DbError::from)?;
        Ok(self
            .decrypted(rows, options.tenant.as_ref())?
            .into_iter()
            .next())
    }

    async fn list(&self, options: &ReadOptions) -> VaultResult<Vec<FamilyMember>> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM family_member ORDER BY created_at DESC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<FamilyMemberRow> = result.take(0).map_err(DbError::from)?;
        Ok(self.decrypted(rows, options.tenant.as_ref())?)
    }

    async fn update(&self, id: Uuid, mut input: UpdateFamilyMember) -> VaultResult<FamilyMember> {
        self.guard.before_persist(&mut input)?;
        let password_hash = self.hash(input.password.as_deref())?;
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.gender.is_some() {
            sets.push("gender = $gender");
        }
        if input.date_of_birth.is_some() {
            sets.push("date_of_birth = $date_of_birth");
        }
        if input.contact_number.is_some() {
            sets.push("contact_number = $contact_number");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.address.is_some() {
            sets.push("address = $address");
        }
        if input.relation.is_some() {
            sets.push("relation = $relation");
        }
        if input.occupation.is_some() {
            sets.push("occupation = $occupation");
        }
        if input.education.is_some() {
            sets.push("education = $education");
        }
        if input.marital_status.is_some() {
            sets.push("marital_status = $marital_status");
        }
        if input.income.is_some() {
            sets.push("income = $income");
        }
        if input.metadata.is_some() {
            sets.push("metadata = $metadata");
        }
        if password_hash.is_some() {
            sets.push("password_hash = $password_hash");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('family_member', $id) SET {}; \
             SELECT meta::id(id) AS record_id, * FROM type::record('family_member', $id);",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(gender) = input.gender {
            builder = builder.bind(("gender", gender_to_string(gender).to_string()));
        }
        if let Some(dob) = input.date_of_birth {
            builder = builder.bind(("date_of_birth", dob.format(DATE_FORMAT).to_string()));
        }
        if let Some(contact_number) = input.contact_number {
            builder = builder.bind(("contact_number", contact_number));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(address) = input.address {
            builder = builder.bind(("address", address));
        }
        if let Some(relation) = input.relation {
            builder = builder.bind(("relation", relation));
        }
        if let Some(occupation) = input.occupation {
            builder = builder.bind(("occupation", occupation));
        }
        if let Some(education) = input.education {
            builder = builder.bind(("education", education));
        }
        if let Some(status) = input.marital_status {
            builder = builder.bind(("marital_status", marital_status_to_string(status).to_string()));
        }
        if let Some(income) = input.income {
            builder = builder.bind(("income", income));
        }
        if let Some(metadata) = input.metadata {
            builder = builder.bind(("metadata", metadata));
        }
        if let Some(hash) = password_hash {
            builder = builder.bind(("password_hash", hash));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| write_error(e, "family_member", UNIQUE_INDEXES))?;

        let rows: Vec<FamilyMemberRow> = result.take(1).map_err(DbError::from)?;
        let member = self
            .decrypted(rows, input.tenant_context.as_ref())?
            .into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound {
                entity: "family_member".into(),
                id: id_str,
            })?;

        Ok(member)
    }

    async fn delete(&self, id: Uuid) -> VaultResult<()> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id FROM type::record('family_member', $id); \
                 DELETE type::record('family_member', $id);",
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
                entity: "family_member".into(),
                id: id_str,
            }
            .into());
        }

        Ok(())
    }
}
