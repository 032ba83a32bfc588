use mediator::Request;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sm_common::User;

use crate::engine::{AddDatasetRequest, EngineRoute};
use crate::error::{MutationError, MutationResult};
use crate::features::datasets::types::DatasetSubmitInput;
use crate::features::MutationContext;
use crate::metadata::assign_submitter_email;
use crate::registry::check_databases_exist;

/// Submit a dataset for processing
///
/// With `input.id` set this re-submits an existing dataset, which requires
/// edit rights on it; `del_first` asks the engine to drop prior results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitDatasetCommand {
    pub input: DatasetSubmitInput,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub del_first: bool,
    pub user: User,
}

impl Request<Result<String, MutationError>> for SubmitDatasetCommand {}

#[tracing::instrument(skip(ctx, command), fields(dataset_id = ?command.input.id, user = %command.user.email))]
pub async fn handle(ctx: MutationContext, command: SubmitDatasetCommand) -> MutationResult<String> {
    let _guard = match command.input.id.as_deref() {
        Some(id) => Some(ctx.locks.acquire(id).await),
        None => None,
    };

    submit(&ctx, command).await.inspect_err(|e| {
        tracing::error!(error = %e, kind = e.kind(), "Dataset submission failed");
    })
}

async fn submit(ctx: &MutationContext, command: SubmitDatasetCommand) -> MutationResult<String> {
    let SubmitDatasetCommand {
        input,
        priority,
        del_first,
        user,
    } = command;

    if let Some(id) = input.id.as_deref() {
        ctx.permissions.assert_can_edit(id, &user).await?;
    }

    let mut metadata: Value = serde_json::from_str(&input.metadata_json)?;
    assign_submitter_email(None, &mut metadata, &user.email);
    ctx.schema.validate(&metadata)?;
    check_databases_exist(ctx.registry.as_ref(), &input.mol_dbs).await?;

    let mut dataset = input.into_dataset(metadata);
    ctx.config_deriver.derive(&mut dataset);

    let body = AddDatasetRequest::new(&dataset, priority, del_first);
    ctx.engine
        .send(dataset.id.as_deref(), &EngineRoute::Add, &body)
        .await
}
