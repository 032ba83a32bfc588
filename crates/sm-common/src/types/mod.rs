//! Common types used across SM services

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A submitted imaging mass-spectrometry dataset
///
/// `metadata` is the user-authored, schema-validated document. `config` is
/// derived from `metadata`, `mol_dbs` and `adducts` and is never edited by
/// hand. `id` is `None` for datasets the engine has not created yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub input_path: String,
    #[serde(rename = "uploadDT", default, skip_serializing_if = "Option::is_none")]
    pub upload_dt: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub config: Value,
    #[serde(default = "default_is_public")]
    pub is_public: bool,
    #[serde(rename = "molDBs", default)]
    pub mol_dbs: Vec<String>,
    #[serde(default)]
    pub adducts: Vec<String>,
}

fn default_is_public() -> bool {
    true
}

impl Dataset {
    /// Submitter email of record, if the metadata carries one
    pub fn submitter_email(&self) -> Option<&str> {
        self.metadata
            .pointer("/Submitted_By/Submitter/Email")
            .and_then(Value::as_str)
    }
}

/// Role of the acting user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

/// The user on whose behalf a mutation runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
}

impl User {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            role: UserRole::User,
        }
    }

    pub fn admin(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            role: UserRole::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// A molecular reference database known to the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MolecularDatabase {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
}
