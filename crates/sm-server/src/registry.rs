//! Molecular database registry
//!
//! Requested database names must exist in the registry. Deprecated
//! databases remain valid targets, so the registry is always queried with
//! deprecated entries included.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use sm_common::MolecularDatabase;
use std::collections::HashSet;
use std::time::Duration;

use crate::config::RegistryConfig;
use crate::error::{MutationError, MutationResult};

/// Read access to the molecular database registry
#[async_trait]
pub trait MolecularDatabaseRegistry: Send + Sync {
    async fn list(&self, hide_deprecated: bool) -> MutationResult<Vec<MolecularDatabase>>;
}

/// Fail with `UnknownDatabase` on the first requested name the registry lacks
#[tracing::instrument(skip(registry))]
pub async fn check_databases_exist(
    registry: &dyn MolecularDatabaseRegistry,
    requested: &[String],
) -> MutationResult<()> {
    if requested.is_empty() {
        return Ok(());
    }

    let known: HashSet<String> = registry
        .list(false)
        .await?
        .into_iter()
        .map(|db| db.name)
        .collect();

    match requested.iter().find(|name| !known.contains(*name)) {
        Some(name) => Err(MutationError::UnknownDatabase { name: name.clone() }),
        None => Ok(()),
    }
}

#[derive(Debug, Deserialize)]
struct DatabaseListResponse {
    data: Vec<MolecularDatabase>,
}

/// Registry backed by the molecular database service
///
/// `GET {base_url}/v1/databases` returns `{"data": [{name, version, deprecated}]}`.
#[derive(Debug, Clone)]
pub struct HttpMolecularDatabaseRegistry {
    client: Client,
    base_url: String,
}

impl HttpMolecularDatabaseRegistry {
    pub fn new(config: &RegistryConfig) -> MutationResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MolecularDatabaseRegistry for HttpMolecularDatabaseRegistry {
    async fn list(&self, hide_deprecated: bool) -> MutationResult<Vec<MolecularDatabase>> {
        let url = format!("{}/v1/databases", self.base_url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MutationError::Registry(format!(
                "listing databases returned {}: {}",
                status, body
            )));
        }

        let listing: DatabaseListResponse = response.json().await?;
        tracing::debug!(count = listing.data.len(), "Fetched molecular databases");

        Ok(listing
            .data
            .into_iter()
            .filter(|db| !(hide_deprecated && db.deprecated))
            .collect())
    }
}

/// Fixed in-process registry
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    databases: Vec<MolecularDatabase>,
}

impl StaticRegistry {
    pub fn new(databases: Vec<MolecularDatabase>) -> Self {
        Self { databases }
    }

    /// Registry of non-deprecated databases with the given names
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            names
                .into_iter()
                .map(|name| MolecularDatabase {
                    name: name.into(),
                    version: None,
                    deprecated: false,
                })
                .collect(),
        )
    }
}

#[async_trait]
impl MolecularDatabaseRegistry for StaticRegistry {
    async fn list(&self, hide_deprecated: bool) -> MutationResult<Vec<MolecularDatabase>> {
        Ok(self
            .databases
            .iter()
            .filter(|db| !(hide_deprecated && db.deprecated))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_unknown_name_is_reported() {
        let registry = StaticRegistry::with_names(["A", "B"]);
        let result = check_databases_exist(&registry, &names(&["A", "C"])).await;
        assert!(matches!(
            result,
            Err(MutationError::UnknownDatabase { ref name }) if name == "C"
        ));
    }

    #[tokio::test]
    async fn test_first_unknown_name_wins() {
        let registry = StaticRegistry::with_names(["A"]);
        let result = check_databases_exist(&registry, &names(&["X", "Y"])).await;
        assert!(matches!(
            result,
            Err(MutationError::UnknownDatabase { ref name }) if name == "X"
        ));
    }

    #[tokio::test]
    async fn test_deprecated_databases_are_accepted() {
        let registry = StaticRegistry::new(vec![MolecularDatabase {
            name: "HMDB-v2.5".to_string(),
            version: Some("2.5".to_string()),
            deprecated: true,
        }]);
        assert!(check_databases_exist(&registry, &names(&["HMDB-v2.5"])).await.is_ok());
        assert!(registry.list(true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_request_skips_registry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let registry = HttpMolecularDatabaseRegistry::new(&RegistryConfig {
            api_url: server.uri(),
            timeout_secs: 5,
        })
        .unwrap();
        assert!(check_databases_exist(&registry, &[]).await.is_ok());
    }

    #[tokio::test]
    async fn test_http_registry_lists_and_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/databases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"id": 1, "name": "HMDB", "version": "2016", "deprecated": false},
                    {"id": 2, "name": "ChEBI", "version": "2016", "deprecated": true}
                ]
            })))
            .mount(&server)
            .await;

        let registry = HttpMolecularDatabaseRegistry::new(&RegistryConfig {
            api_url: format!("{}/", server.uri()),
            timeout_secs: 5,
        })
        .unwrap();

        assert_eq!(registry.list(false).await.unwrap().len(), 2);
        let visible = registry.list(true).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "HMDB");
        assert!(check_databases_exist(&registry, &names(&["ChEBI"])).await.is_ok());
    }

    #[tokio::test]
    async fn test_http_registry_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/databases"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let registry = HttpMolecularDatabaseRegistry::new(&RegistryConfig {
            api_url: server.uri(),
            timeout_secs: 5,
        })
        .unwrap();
        let err = registry.list(false).await.unwrap_err();
        assert!(matches!(err, MutationError::Registry(ref msg) if msg.contains("down")));
    }
}
