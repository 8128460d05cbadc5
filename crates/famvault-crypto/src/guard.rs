//! Field guard: transparent per-tenant encryption for declared fields.
//!
//! A [`FieldGuard`] is built once per entity collection with the list of
//! field names to protect. The storage layer calls
//! [`FieldGuard::before_persist`] on every value it is about to write
//! and [`FieldGuard::after_load`] on every batch it reads.

use std::sync::Arc;

use famvault_core::guard::{GuardedFields, TenantContext, TenantScoped};
use tracing::warn;

use crate::envelope::{decrypt_field, encrypt_field};
use crate::error::CryptoError;
use crate::key::{MasterKey, derive_tenant_key};

#[derive(Clone)]
pub struct FieldGuard {
    master: Arc<MasterKey>,
    fields: &'static [&'static str],
}

impl FieldGuard {
    pub fn new(master: Arc<MasterKey>, fields: &'static [&'static str]) -> Self {
        Self { master, fields }
    }

    /// Names of the guarded fields.
    pub fn fields(&self) -> &'static [&'static str] {
        self.fields
    }

    /// Encrypt every guarded field that is set and non-empty.
    ///
    /// Without a tenant context the value is left untouched and the
    /// write goes ahead, so the fields are stored in plaintext.
    pub fn before_persist<E>(&self, entity: &mut E) -> Result<(), CryptoError>
    where
        E: GuardedFields + TenantScoped,
    {
        if self.fields.is_empty() {
            return Ok(());
        }

        let key = match entity.tenant_context() {
            Some(ctx) => derive_tenant_key(ctx.tenant_id(), &self.master)?,
            None => {
                warn!(
                    fields = ?self.fields,
                    "Persisting without tenant context; guarded fields stored unencrypted"
                );
                return Ok(());
            }
        };

        for field in self.fields {
            if let Some(value) = entity.guarded_field_mut(field) {
                if !value.is_empty() {
                    *value = encrypt_field(value, &key)?;
                }
            }
        }
        Ok(())
    }

    /// Decrypt every guarded field of every entity in place.
    ///
    /// Without a tenant context the entities are returned as stored.
    pub fn after_load<E>(&self, entities: &mut [E], context: Option<&TenantContext>)
    where
        E: GuardedFields,
    {
        let Some(context) = context else {
            return;
        };
        if self.fields.is_empty() || entities.is_empty() {
            return;
        }

        let key = match derive_tenant_key(context.tenant_id(), &self.master) {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, "Tenant key unavailable; guarded fields left as stored");
                return;
            }
        };
        for entity in entities.iter_mut() {
            for field in self.fields {
                if let Some(value) = entity.guarded_field_mut(field) {
                    if !value.is_empty() {
                        *value = decrypt_field(value, &key);
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for FieldGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldGuard")
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}
