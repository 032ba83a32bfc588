//! Processing engine gateway
//!
//! Every engine call is a JSON `POST`. A non-2xx status fails with
//! `EngineRequestFailed` carrying the raw response text; on success the raw
//! body is handed back unparsed. Calls are not retried.

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use sm_common::Dataset;
use std::fmt;
use std::time::Duration;

use crate::config::EngineConfig;
use crate::error::{MutationError, MutationResult};

/// Engine API routes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineRoute {
    Add,
    Update(String),
    Delete(String),
    AddOpticalImage(String),
    DeleteOpticalImage(String),
}

impl EngineRoute {
    pub fn path(&self) -> String {
        match self {
            EngineRoute::Add => "/v1/datasets/add".to_string(),
            EngineRoute::Update(id) => format!("/v1/datasets/{}/update", id),
            EngineRoute::Delete(id) => format!("/v1/datasets/{}/delete", id),
            EngineRoute::AddOpticalImage(id) => format!("/v1/datasets/{}/add-optical-image", id),
            EngineRoute::DeleteOpticalImage(id) => format!("/v1/datasets/{}/del-optical-image", id),
        }
    }
}

impl fmt::Display for EngineRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Body of `/v1/datasets/add`
#[derive(Debug, Clone, Serialize)]
pub struct AddDatasetRequest<'a> {
    pub name: &'a str,
    pub input_path: &'a str,
    pub upload_dt: Option<String>,
    pub metadata: &'a Value,
    pub config: &'a Value,
    pub priority: i32,
    pub del_first: bool,
    pub is_public: bool,
    pub mol_dbs: &'a [String],
    pub adducts: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a str>,
}

impl<'a> AddDatasetRequest<'a> {
    pub fn new(ds: &'a Dataset, priority: i32, del_first: bool) -> Self {
        Self {
            name: &ds.name,
            input_path: &ds.input_path,
            upload_dt: ds.upload_dt.map(|dt| dt.to_rfc3339()),
            metadata: &ds.metadata,
            config: &ds.config,
            priority,
            del_first,
            is_public: ds.is_public,
            mol_dbs: &ds.mol_dbs,
            adducts: &ds.adducts,
            id: ds.id.as_deref(),
        }
    }
}

/// Body of `/v1/datasets/{id}/update`
#[derive(Debug, Clone, Serialize)]
pub struct UpdateDatasetRequest<'a> {
    pub metadata: &'a Value,
    pub config: &'a Value,
    pub name: &'a str,
    pub upload_dt: Option<String>,
    pub priority: i32,
    pub is_public: bool,
}

impl<'a> UpdateDatasetRequest<'a> {
    pub fn new(ds: &'a Dataset, priority: i32) -> Self {
        Self {
            metadata: &ds.metadata,
            config: &ds.config,
            name: &ds.name,
            upload_dt: ds.upload_dt.map(|dt| dt.to_rfc3339()),
            priority,
            is_public: ds.is_public,
        }
    }
}

/// Body of `/v1/datasets/{id}/add-optical-image`
#[derive(Debug, Clone, Serialize)]
pub struct AddOpticalImageRequest<'a> {
    pub url: &'a str,
    pub transform: &'a Value,
}

/// Body of the delete routes
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct EmptyRequest {}

/// HTTP client for the processing engine
#[derive(Debug, Clone)]
pub struct EngineGateway {
    client: Client,
    base_url: String,
}

impl EngineGateway {
    pub fn new(config: &EngineConfig) -> MutationResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Send `body` to `route`, returning the raw response body
    pub async fn send<B>(
        &self,
        dataset_id: Option<&str>,
        route: &EngineRoute,
        body: &B,
    ) -> MutationResult<String>
    where
        B: Serialize + fmt::Debug + ?Sized,
    {
        let url = format!("{}{}", self.base_url, route.path());
        let response = self.client.post(&url).json(body).send().await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            tracing::warn!(
                route = %route,
                dataset_id = dataset_id.unwrap_or("-"),
                status = status.as_u16(),
                "Engine request failed"
            );
            return Err(MutationError::EngineRequestFailed {
                route: route.path(),
                body: text,
            });
        }

        tracing::info!(
            route = %route,
            dataset_id = dataset_id.unwrap_or("-"),
            "Engine request succeeded"
        );
        tracing::debug!(body = ?body, "Engine request body");
        Ok(text)
    }
}
