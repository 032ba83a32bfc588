use mediator::Request;
use serde::{Deserialize, Serialize};
use sm_common::User;

use crate::engine::{EmptyRequest, EngineRoute};
use crate::error::{MutationError, MutationResult};
use crate::features::MutationContext;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDatasetCommand {
    pub dataset_id: String,
    pub user: User,
}

impl Request<Result<String, MutationError>> for DeleteDatasetCommand {}

#[tracing::instrument(skip(ctx, command), fields(dataset_id = %command.dataset_id, user = %command.user.email))]
pub async fn handle(ctx: MutationContext, command: DeleteDatasetCommand) -> MutationResult<String> {
    let _guard = ctx.locks.acquire(&command.dataset_id).await;

    delete(&ctx, &command).await.inspect_err(|e| {
        tracing::error!(error = %e, kind = e.kind(), "Dataset deletion failed");
    })
}

async fn delete(ctx: &MutationContext, command: &DeleteDatasetCommand) -> MutationResult<String> {
    let id = &command.dataset_id;
    ctx.permissions.assert_can_edit(id, &command.user).await?;

    // The dataset may have no optical image; its removal must not block deletion
    if let Err(e) = ctx
        .engine
        .send(Some(id.as_str()), &EngineRoute::DeleteOpticalImage(id.clone()), &EmptyRequest {})
        .await
    {
        tracing::warn!(dataset_id = %id, error = %e, "Optical image deletion failed, deleting dataset anyway");
    }

    ctx.engine
        .send(Some(id.as_str()), &EngineRoute::Delete(id.clone()), &EmptyRequest {})
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::*;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn command(user: User) -> DeleteDatasetCommand {
        DeleteDatasetCommand {
            dataset_id: "d1".to_string(),
            user,
        }
    }

    async fn context(engine: &MockServer) -> MutationContext {
        TestContext::new(engine)
            .with_dataset(TestDataset::new("d1", "owner@x.org").build())
            .build()
    }

    #[tokio::test]
    async fn test_delete_survives_optical_image_failure() {
        let engine = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/datasets/d1/del-optical-image"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no optical image"))
            .expect(1)
            .mount(&engine)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/datasets/d1/delete"))
            .respond_with(ResponseTemplate::new(200).set_body_string("deleted"))
            .expect(1)
            .mount(&engine)
            .await;

        let result = handle(context(&engine).await, command(User::new("owner@x.org"))).await;
        assert_eq!(result.unwrap(), "deleted");
    }

    #[tokio::test]
    async fn test_dataset_deletion_failure_is_authoritative() {
        let engine = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/datasets/d1/del-optical-image"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&engine)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/datasets/d1/delete"))
            .respond_with(ResponseTemplate::new(500).set_body_string("engine down"))
            .mount(&engine)
            .await;

        let err = handle(context(&engine).await, command(User::new("owner@x.org")))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MutationError::EngineRequestFailed { ref body, .. } if body == "engine down"
        ));
    }

    #[tokio::test]
    async fn test_forbidden_user_triggers_no_engine_call() {
        let engine = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&engine)
            .await;

        let err = handle(context(&engine).await, command(User::new("intruder@x.org")))
            .await
            .unwrap_err();
        assert!(matches!(err, MutationError::Forbidden { .. }));
    }
}
