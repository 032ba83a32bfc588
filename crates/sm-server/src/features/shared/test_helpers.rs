//! Test helpers and fixtures for handler tests
//!
//! # Examples
//!
//! ```rust,ignore
//! use crate::features::shared::test_helpers::*;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let engine = MockServer::start().await;
//!     let ctx = TestContext::new(&engine)
//!         .with_dataset(TestDataset::new("d1", "owner@x.org").build())
//!         .build();
//!     // ... test logic ...
//! }
//! ```

use serde_json::{json, Value};
use sm_common::Dataset;
use std::sync::Arc;
use wiremock::MockServer;

use crate::auth::SubmitterPolicy;
use crate::config::EngineConfig;
use crate::engine::EngineGateway;
use crate::features::MutationContext;
use crate::locks::DatasetLocks;
use crate::metadata::MetadataSchema;
use crate::processing_config::{ConfigDeriver, ProcessingConfigDeriver};
use crate::registry::StaticRegistry;
use crate::store::InMemoryDatasetStore;

pub const IMAGE_STORAGE_URL: &str = "http://img.test:4201";

/// Metadata that passes the bundled schema
pub fn valid_metadata(submitter_email: &str) -> Value {
    json!({
        "Sample_Information": {
            "Organism": "Mus musculus",
            "Organism_Part": "Brain",
            "Condition": "Wildtype"
        },
        "Sample_Preparation": {
            "Sample_Stabilisation": "Fresh frozen",
            "Tissue_Modification": "None",
            "MALDI_Matrix": "DHB",
            "MALDI_Matrix_Application": "TM sprayer"
        },
        "MS_Analysis": {
            "Polarity": "Positive",
            "Ionisation_Source": "MALDI",
            "Analyzer": "Orbitrap",
            "Detector_Resolving_Power": {"Resolving_Power": 140000, "mz": 200}
        },
        "Submitted_By": {
            "Institution": "EMBL",
            "Submitter": {
                "First_Name": "Ann",
                "Surname": "Lee",
                "Email": submitter_email
            }
        }
    })
}

/// Builder for stored datasets; `config` is derived like a real submission
#[derive(Debug, Clone)]
pub struct TestDataset {
    dataset: Dataset,
}

impl TestDataset {
    pub fn new(id: &str, submitter_email: &str) -> Self {
        Self {
            dataset: Dataset {
                id: Some(id.to_string()),
                name: format!("dataset {id}"),
                input_path: format!("s3a://sm-test/{id}"),
                upload_dt: None,
                metadata: valid_metadata(submitter_email),
                config: Value::Null,
                is_public: true,
                mol_dbs: vec!["HMDB".to_string()],
                adducts: vec![],
            },
        }
    }

    pub fn with_mol_dbs(mut self, mol_dbs: &[&str]) -> Self {
        self.dataset.mol_dbs = mol_dbs.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn build(mut self) -> Dataset {
        ProcessingConfigDeriver.derive(&mut self.dataset);
        self.dataset
    }
}

/// Builder for a [`MutationContext`] against a mock engine
pub struct TestContext {
    engine_url: String,
    store: InMemoryDatasetStore,
    registry: StaticRegistry,
}

impl TestContext {
    pub fn new(engine: &MockServer) -> Self {
        Self {
            engine_url: engine.uri(),
            store: InMemoryDatasetStore::new(),
            registry: StaticRegistry::with_names(["HMDB", "ChEBI"]),
        }
    }

    pub fn with_dataset(self, dataset: Dataset) -> Self {
        self.store.insert(dataset);
        self
    }

    pub fn build(self) -> MutationContext {
        let store = Arc::new(self.store);
        MutationContext {
            store: store.clone(),
            permissions: Arc::new(SubmitterPolicy::new(store)),
            registry: Arc::new(self.registry),
            config_deriver: Arc::new(ProcessingConfigDeriver),
            engine: EngineGateway::new(&EngineConfig {
                api_url: self.engine_url,
                timeout_secs: 5,
            })
            .unwrap(),
            schema: Arc::new(MetadataSchema::bundled().unwrap()),
            locks: DatasetLocks::new(),
            image_storage_url: IMAGE_STORAGE_URL.to_string(),
        }
    }
}
