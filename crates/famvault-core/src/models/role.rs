//! Role domain model and the permission entries it grants.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Actions granted on one module, e.g. `documents: {read, delete}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModulePermission {
    pub module_key: String,
    pub actions: BTreeSet<String>,
}

impl ModulePermission {
    pub fn new<I, S>(module_key: impl Into<String>, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            module_key: module_key.into(),
            actions: actions.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether this entry grants `action` on `module_key`.
    pub fn allows(&self, module_key: &str, action: &str) -> bool {
        self.module_key == module_key && self.actions.contains(action)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    /// Role name, matched against a principal's resolved role at login.
    pub name: String,
    pub permissions: Vec<ModulePermission>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    pub name: String,
    pub permissions: Vec<ModulePermission>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateRole {
    pub name: Option<String>,
    pub permissions: Option<Vec<ModulePermission>>,
    pub is_active: Option<bool>,
}
