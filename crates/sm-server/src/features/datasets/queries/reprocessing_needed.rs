use mediator::Request;
use serde::{Deserialize, Serialize};
use sm_common::User;

use crate::error::{MutationError, MutationResult};
use crate::features::datasets::commands::update::prepare_edit;
use crate::features::datasets::types::DatasetUpdateInput;
use crate::features::MutationContext;
use crate::reprocessing;

/// Dry-run of an update: would it need the dataset to be reprocessed?
///
/// Authorization, lookup and validation failures still surface as errors;
/// only the reprocessing outcome is turned into a boolean.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReprocessingNeededQuery {
    pub input: DatasetUpdateInput,
    pub user: User,
}

impl Request<Result<bool, MutationError>> for ReprocessingNeededQuery {}

#[tracing::instrument(skip(ctx, query), fields(dataset_id = %query.input.id))]
pub async fn handle(ctx: MutationContext, query: ReprocessingNeededQuery) -> MutationResult<bool> {
    let (current, updated) = prepare_edit(&ctx, &query.input, &query.user).await?;
    let impact = reprocessing::assess(&current, &updated);
    tracing::debug!(classification = ?impact.classification, "Assessed edit");
    Ok(impact.requires_reprocessing())
}
