//! Change-impact classification for dataset edits
//!
//! Decides from the processing-config diff whether an edit can be applied
//! in place or needs the engine to redo work:
//!
//! - changes outside `/databases` alter processing settings and invalidate
//!   engine-side state, so the dataset must be deleted and resubmitted;
//! - changes limited to `/databases` only need a resubmission;
//! - anything else, including pure reordering (`move`), needs nothing.

use serde::Serialize;
use sm_common::Dataset;

use crate::diff::{diff, PatchOp, PatchOperation};
use crate::error::{MutationError, MutationResult};

const DATABASES_PATH: &str = "/databases";

/// Impact class of an edit, in increasing severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeClassification {
    NoChange,
    DatabaseUpdate,
    ProcessingSettingsUpdate,
}

/// Classification plus the diffs it was computed from
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeImpact {
    pub classification: ChangeClassification,
    /// Carried for display only, never used to classify
    pub metadata_diff: Vec<PatchOperation>,
    pub config_diff: Vec<PatchOperation>,
}

impl ChangeImpact {
    pub fn requires_reprocessing(&self) -> bool {
        self.classification != ChangeClassification::NoChange
    }

    /// Turn the classification into the caller-facing outcome
    pub fn into_result(self) -> MutationResult<()> {
        let ChangeImpact {
            classification,
            metadata_diff,
            config_diff,
        } = self;
        match classification {
            ChangeClassification::NoChange => Ok(()),
            ChangeClassification::DatabaseUpdate => Err(MutationError::ReprocessingRequired {
                metadata_diff,
                config_diff,
            }),
            ChangeClassification::ProcessingSettingsUpdate => {
                Err(MutationError::ResubmissionRequired {
                    metadata_diff,
                    config_diff,
                })
            },
        }
    }
}

/// Classify a processing-config diff
pub fn classify_config_diff(config_diff: &[PatchOperation]) -> ChangeClassification {
    config_diff
        .iter()
        .filter(|op| op.op != PatchOp::Move)
        .map(|op| {
            if op.path.starts_with(DATABASES_PATH) {
                ChangeClassification::DatabaseUpdate
            } else {
                ChangeClassification::ProcessingSettingsUpdate
            }
        })
        .max()
        .unwrap_or(ChangeClassification::NoChange)
}

/// Diff two versions of a dataset and classify the edit
pub fn assess(old: &Dataset, new: &Dataset) -> ChangeImpact {
    let config_diff = diff(&old.config, &new.config);
    let metadata_diff = diff(&old.metadata, &new.metadata);
    ChangeImpact {
        classification: classify_config_diff(&config_diff),
        metadata_diff,
        config_diff,
    }
}

/// Fail with `ResubmissionRequired` / `ReprocessingRequired` when the edit
/// cannot be applied in place
pub fn evaluate(old: &Dataset, new: &Dataset) -> MutationResult<()> {
    assess(old, new).into_result()
}
