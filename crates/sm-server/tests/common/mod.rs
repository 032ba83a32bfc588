//! Common test utilities for sm-server integration tests
//!
//! Stands up mock HTTP services for the processing engine and the molecular
//! database registry, and wires them into a [`MutationContext`] backed by an
//! in-memory dataset store.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::TestEnvironment;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let env = TestEnvironment::start(&["HMDB"]).await;
//!     let mut mediator = env.mediator();
//!     // Mount engine expectations on `env.engine`, then dispatch commands
//! }
//! ```

#![allow(dead_code)]

use serde_json::{json, Value};
use sm_common::Dataset;
use std::sync::Arc;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use sm_server::auth::SubmitterPolicy;
use sm_server::config::{EngineConfig, RegistryConfig};
use sm_server::cqrs::{build_mediator, AppMediator};
use sm_server::engine::EngineGateway;
use sm_server::features::MutationContext;
use sm_server::locks::DatasetLocks;
use sm_server::metadata::MetadataSchema;
use sm_server::processing_config::{ConfigDeriver, ProcessingConfigDeriver};
use sm_server::registry::HttpMolecularDatabaseRegistry;
use sm_server::store::InMemoryDatasetStore;

pub const IMAGE_STORAGE_URL: &str = "http://img-storage.test:4201";

/// Mock collaborators plus a context wired to them
pub struct TestEnvironment {
    pub engine: MockServer,
    pub registry: MockServer,
    pub store: InMemoryDatasetStore,
    pub ctx: MutationContext,
}

impl TestEnvironment {
    /// Start mock services; the registry knows `databases`
    pub async fn start(databases: &[&str]) -> Self {
        let engine = MockServer::start().await;
        let registry = MockServer::start().await;

        let listing: Vec<Value> = databases
            .iter()
            .enumerate()
            .map(|(id, name)| json!({"id": id, "name": name, "version": "1", "deprecated": false}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/v1/databases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": listing })))
            .mount(&registry)
            .await;

        let store = InMemoryDatasetStore::new();
        let shared_store = Arc::new(store.clone());
        let ctx = MutationContext {
            store: shared_store.clone(),
            permissions: Arc::new(SubmitterPolicy::new(shared_store)),
            registry: Arc::new(
                HttpMolecularDatabaseRegistry::new(&RegistryConfig {
                    api_url: registry.uri(),
                    timeout_secs: 5,
                })
                .expect("registry client"),
            ),
            config_deriver: Arc::new(ProcessingConfigDeriver),
            engine: EngineGateway::new(&EngineConfig {
                api_url: engine.uri(),
                timeout_secs: 5,
            })
            .expect("engine client"),
            schema: Arc::new(MetadataSchema::bundled().expect("bundled schema")),
            locks: DatasetLocks::new(),
            image_storage_url: IMAGE_STORAGE_URL.to_string(),
        };

        Self {
            engine,
            registry,
            store,
            ctx,
        }
    }

    pub fn mediator(&self) -> AppMediator {
        build_mediator(self.ctx.clone())
    }

    /// Store a dataset as the engine would have persisted it
    pub fn insert_dataset(&self, id: &str, submitter_email: &str, mol_dbs: &[&str]) -> Dataset {
        let mut dataset = Dataset {
            id: Some(id.to_string()),
            name: format!("dataset {id}"),
            input_path: format!("s3a://sm-test/{id}"),
            upload_dt: None,
            metadata: valid_metadata(submitter_email),
            config: Value::Null,
            is_public: true,
            mol_dbs: mol_dbs.iter().map(|s| s.to_string()).collect(),
            adducts: vec![],
        };
        ProcessingConfigDeriver.derive(&mut dataset);
        self.store.insert(dataset.clone());
        dataset
    }

    /// Bodies of the requests the engine received on `route`
    pub async fn engine_bodies(&self, route: &str) -> Vec<Value> {
        self.engine
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == route)
            .map(|r| serde_json::from_slice(&r.body).expect("engine body is JSON"))
            .collect()
    }
}

/// Metadata that passes the bundled schema
pub fn valid_metadata(submitter_email: &str) -> Value {
    json!({
        "Sample_Information": {
            "Organism": "Homo sapiens",
            "Organism_Part": "Skin",
            "Condition": "Healthy"
        },
        "Sample_Preparation": {
            "Sample_Stabilisation": "Fresh frozen",
            "Tissue_Modification": "None",
            "MALDI_Matrix": "DAN",
            "MALDI_Matrix_Application": "Sublimation"
        },
        "MS_Analysis": {
            "Polarity": "Negative",
            "Ionisation_Source": "MALDI",
            "Analyzer": "FTICR",
            "Detector_Resolving_Power": {"Resolving_Power": 280000, "mz": 400}
        },
        "Submitted_By": {
            "Institution": "EMBL",
            "Submitter": {
                "First_Name": "Sam",
                "Surname": "Ng",
                "Email": submitter_email
            }
        }
    })
}
