//! Read access to stored datasets
//!
//! The mutation core never writes datasets itself; the engine persists them.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde_json::Value;
use sm_common::Dataset;
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::MutationResult;

#[async_trait]
pub trait DatasetStore: Send + Sync {
    async fn fetch(&self, id: &str) -> MutationResult<Option<Dataset>>;
}

#[derive(Debug, sqlx::FromRow)]
struct DatasetRow {
    id: String,
    name: String,
    input_path: String,
    upload_dt: Option<NaiveDateTime>,
    metadata: Json<Value>,
    config: Json<Value>,
    is_public: bool,
    mol_dbs: Option<Vec<String>>,
    adducts: Option<Vec<String>>,
}

impl From<DatasetRow> for Dataset {
    fn from(row: DatasetRow) -> Self {
        Dataset {
            id: Some(row.id),
            name: row.name,
            input_path: row.input_path,
            upload_dt: row.upload_dt.map(|dt| dt.and_utc()),
            metadata: row.metadata.0,
            config: row.config.0,
            is_public: row.is_public,
            mol_dbs: row.mol_dbs.unwrap_or_default(),
            adducts: row.adducts.unwrap_or_default(),
        }
    }
}

/// Postgres-backed store over the `dataset` table
#[derive(Debug, Clone)]
pub struct PgDatasetStore {
    pool: PgPool,
}

impl PgDatasetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DatasetStore for PgDatasetStore {
    async fn fetch(&self, id: &str) -> MutationResult<Option<Dataset>> {
        let row = sqlx::query_as::<_, DatasetRow>(
            r#"
            SELECT id, name, input_path, upload_dt, metadata, config,
                   is_public, mol_dbs, adducts
            FROM dataset
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        tracing::debug!(dataset_id = %id, found = row.is_some(), "Fetched dataset");
        Ok(row.map(Dataset::from))
    }
}

/// In-process store, keyed by dataset id
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatasetStore {
    datasets: Arc<RwLock<HashMap<String, Dataset>>>,
}

impl InMemoryDatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `dataset` under its id; datasets without an id are ignored
    pub fn insert(&self, dataset: Dataset) {
        let Some(id) = dataset.id.clone() else {
            return;
        };
        if let Ok(mut datasets) = self.datasets.write() {
            datasets.insert(id, dataset);
        }
    }
}

#[async_trait]
impl DatasetStore for InMemoryDatasetStore {
    async fn fetch(&self, id: &str) -> MutationResult<Option<Dataset>> {
        Ok(self
            .datasets
            .read()
            .ok()
            .and_then(|datasets| datasets.get(id).cloned()))
    }
}
