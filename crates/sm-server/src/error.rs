//! Mutation error types
//!
//! Every failure a dataset mutation can report to its caller. All variants
//! are user-facing: [`MutationError::payload`] renders the discriminated JSON
//! payload returned to clients.

use serde_json::{json, Value};
use thiserror::Error;

use crate::diff::PatchOperation;
use crate::metadata::Violation;

/// Result type alias for mutation operations
pub type MutationResult<T> = std::result::Result<T, MutationError>;

#[derive(Error, Debug)]
pub enum MutationError {
    /// Metadata failed schema validation; carries every violation found
    #[error("Metadata validation failed with {} violation(s)", violations.len())]
    ValidationFailed { violations: Vec<Violation> },

    #[error("Molecular database '{name}' does not exist")]
    UnknownDatabase { name: String },

    /// Processing settings changed: the dataset must be deleted and submitted again
    #[error("Processing settings changed, dataset must be resubmitted with delFirst")]
    ResubmissionRequired {
        metadata_diff: Vec<PatchOperation>,
        config_diff: Vec<PatchOperation>,
    },

    /// Only the molecular databases changed: the dataset must be submitted again
    #[error("Molecular databases changed, dataset must be resubmitted")]
    ReprocessingRequired {
        metadata_diff: Vec<PatchOperation>,
        config_diff: Vec<PatchOperation>,
    },

    #[error("Not allowed to edit dataset '{dataset_id}'")]
    Forbidden { dataset_id: String },

    #[error("Dataset '{0}' does not exist")]
    NotFound(String),

    #[error("Engine request to {route} failed: {body}")]
    EngineRequestFailed { route: String, body: String },

    #[error("Metadata is not valid JSON: {0}")]
    InvalidMetadataJson(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Dataset store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("Molecular database registry error: {0}")]
    Registry(String),
}

impl MutationError {
    /// Short discriminator used in the client payload
    pub fn kind(&self) -> &'static str {
        match self {
            MutationError::ValidationFailed { .. } => "failed_validation",
            MutationError::UnknownDatabase { .. } => "wrong_moldb_name",
            MutationError::ResubmissionRequired { .. } => "drop_submit_needed",
            MutationError::ReprocessingRequired { .. } => "submit_needed",
            MutationError::Forbidden { .. } => "forbidden",
            MutationError::NotFound(_) => "not_found",
            MutationError::EngineRequestFailed { .. } => "engine_request_failed",
            MutationError::InvalidMetadataJson(_) => "invalid_metadata_json",
            MutationError::Http(_) => "http_error",
            MutationError::Store(_) => "store_error",
            MutationError::Registry(_) => "registry_error",
        }
    }

    /// True for the two conditions raised by the change-impact classifier
    pub fn requires_reprocessing(&self) -> bool {
        matches!(
            self,
            MutationError::ResubmissionRequired { .. } | MutationError::ReprocessingRequired { .. }
        )
    }

    /// Structured payload for the caller
    pub fn payload(&self) -> Value {
        let kind = self.kind();
        match self {
            MutationError::ValidationFailed { violations } => json!({
                "type": kind,
                "validation_errors": violations,
            }),
            MutationError::UnknownDatabase { name } => json!({
                "type": kind,
                "moldb_name": name,
            }),
            MutationError::ResubmissionRequired {
                metadata_diff,
                config_diff,
            } => json!({
                "type": kind,
                "hint": "Resubmission needed. Call 'submitDataset' with 'delFirst: true'.",
                "metadata_diff": metadata_diff,
                "config_diff": config_diff,
            }),
            MutationError::ReprocessingRequired {
                metadata_diff,
                config_diff,
            } => json!({
                "type": kind,
                "hint": "Resubmission needed. Call 'submitDataset'.",
                "metadata_diff": metadata_diff,
                "config_diff": config_diff,
            }),
            MutationError::Forbidden { dataset_id } => json!({
                "type": kind,
                "dataset_id": dataset_id,
            }),
            MutationError::NotFound(id) => json!({
                "type": kind,
                "dataset_id": id,
            }),
            MutationError::EngineRequestFailed { route, body } => json!({
                "type": kind,
                "route": route,
                "body": body,
            }),
            // Internal failures do not leak their details to clients
            MutationError::Http(_) | MutationError::Store(_) | MutationError::Registry(_) => {
                json!({ "type": kind, "message": "An internal error occurred" })
            },
            MutationError::InvalidMetadataJson(e) => json!({
                "type": kind,
                "message": e.to_string(),
            }),
        }
    }
}
