use mediator::Request;
use serde::{Deserialize, Serialize};
use sm_common::{Dataset, User};

use crate::engine::{EngineRoute, UpdateDatasetRequest};
use crate::error::{MutationError, MutationResult};
use crate::features::datasets::types::DatasetUpdateInput;
use crate::features::MutationContext;
use crate::metadata::assign_submitter_email;
use crate::registry::check_databases_exist;
use crate::reprocessing;

/// Edit a stored dataset in place
///
/// Fails with `ResubmissionRequired` / `ReprocessingRequired` instead of
/// calling the engine when the edit changes the processing config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDatasetCommand {
    pub input: DatasetUpdateInput,
    #[serde(default)]
    pub priority: i32,
    pub user: User,
}

impl Request<Result<String, MutationError>> for UpdateDatasetCommand {}

#[tracing::instrument(skip(ctx, command), fields(dataset_id = %command.input.id, user = %command.user.email))]
pub async fn handle(ctx: MutationContext, command: UpdateDatasetCommand) -> MutationResult<String> {
    let _guard = ctx.locks.acquire(&command.input.id).await;

    update(&ctx, command).await.inspect_err(|e| {
        tracing::error!(error = %e, kind = e.kind(), "Dataset update failed");
    })
}

async fn update(ctx: &MutationContext, command: UpdateDatasetCommand) -> MutationResult<String> {
    let (current, updated) = prepare_edit(ctx, &command.input, &command.user).await?;
    reprocessing::evaluate(&current, &updated)?;

    let body = UpdateDatasetRequest::new(&updated, command.priority);
    ctx.engine
        .send(
            Some(command.input.id.as_str()),
            &EngineRoute::Update(command.input.id.clone()),
            &body,
        )
        .await
}

/// Authorize, load the stored dataset and build its edited version
///
/// The edited version keeps the stored submitter, passes validation and
/// carries a freshly derived config. Shared with the reprocessing dry-run.
pub(crate) async fn prepare_edit(
    ctx: &MutationContext,
    input: &DatasetUpdateInput,
    user: &User,
) -> MutationResult<(Dataset, Dataset)> {
    ctx.permissions.assert_can_edit(&input.id, user).await?;

    let current = ctx
        .store
        .fetch(&input.id)
        .await?
        .ok_or_else(|| MutationError::NotFound(input.id.clone()))?;

    let mut updated = input.apply_to(&current)?;
    assign_submitter_email(Some(&current.metadata), &mut updated.metadata, &user.email);
    ctx.schema.validate(&updated.metadata)?;
    if let Some(mol_dbs) = &input.mol_dbs {
        check_databases_exist(ctx.registry.as_ref(), mol_dbs).await?;
    }
    ctx.config_deriver.derive(&mut updated);

    Ok((current, updated))
}
