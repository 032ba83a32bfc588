use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sm_common::Dataset;

use crate::error::MutationResult;

/// Client input for creating (or recreating) a dataset
///
/// Metadata arrives as a JSON string and is parsed by the handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSubmitInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub input_path: String,
    #[serde(rename = "uploadDT", default, skip_serializing_if = "Option::is_none")]
    pub upload_dt: Option<DateTime<Utc>>,
    pub metadata_json: String,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(rename = "molDBs", default)]
    pub mol_dbs: Vec<String>,
    #[serde(default)]
    pub adducts: Vec<String>,
}

impl DatasetSubmitInput {
    /// Dataset carrying `metadata`; `config` is left for the deriver
    pub fn into_dataset(self, metadata: Value) -> Dataset {
        Dataset {
            id: self.id,
            name: self.name,
            input_path: self.input_path,
            upload_dt: self.upload_dt,
            metadata,
            config: Value::Null,
            is_public: self.is_public,
            mol_dbs: self.mol_dbs,
            adducts: self.adducts,
        }
    }
}

/// Client input for editing a stored dataset; absent fields stay unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetUpdateInput {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_path: Option<String>,
    #[serde(rename = "uploadDT", default, skip_serializing_if = "Option::is_none")]
    pub upload_dt: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_json: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(rename = "molDBs", default, skip_serializing_if = "Option::is_none")]
    pub mol_dbs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adducts: Option<Vec<String>>,
}

impl DatasetUpdateInput {
    /// Overlay the supplied fields on `current`
    ///
    /// Fails with `InvalidMetadataJson` when `metadata_json` does not parse.
    pub fn apply_to(&self, current: &Dataset) -> MutationResult<Dataset> {
        let mut updated = current.clone();
        if let Some(metadata_json) = &self.metadata_json {
            updated.metadata = serde_json::from_str(metadata_json)?;
        }
        if let Some(name) = &self.name {
            updated.name = name.clone();
        }
        if let Some(input_path) = &self.input_path {
            updated.input_path = input_path.clone();
        }
        if let Some(upload_dt) = self.upload_dt {
            updated.upload_dt = Some(upload_dt);
        }
        if let Some(is_public) = self.is_public {
            updated.is_public = is_public;
        }
        if let Some(mol_dbs) = &self.mol_dbs {
            updated.mol_dbs = mol_dbs.clone();
        }
        if let Some(adducts) = &self.adducts {
            updated.adducts = adducts.clone();
        }
        Ok(updated)
    }
}

fn default_true() -> bool {
    true
}
