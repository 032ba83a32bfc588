use mediator::Request;
use serde::{Deserialize, Serialize};
use sm_common::User;

use crate::engine::{EmptyRequest, EngineRoute};
use crate::error::{MutationError, MutationResult};
use crate::features::MutationContext;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteOpticalImageCommand {
    pub dataset_id: String,
    pub user: User,
}

impl Request<Result<String, MutationError>> for DeleteOpticalImageCommand {}

#[tracing::instrument(skip(ctx, command), fields(dataset_id = %command.dataset_id, user = %command.user.email))]
pub async fn handle(ctx: MutationContext, command: DeleteOpticalImageCommand) -> MutationResult<String> {
    let _guard = ctx.locks.acquire(&command.dataset_id).await;

    delete_optical_image(&ctx, &command).await.inspect_err(|e| {
        tracing::error!(error = %e, kind = e.kind(), "Deleting optical image failed");
    })
}

async fn delete_optical_image(
    ctx: &MutationContext,
    command: &DeleteOpticalImageCommand,
) -> MutationResult<String> {
    let id = &command.dataset_id;
    ctx.permissions.assert_can_edit(id, &command.user).await?;
    ctx.engine
        .send(Some(id.as_str()), &EngineRoute::DeleteOpticalImage(id.clone()), &EmptyRequest {})
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

    #[tokio::test]
    async fn test_delete_optical_image() {
        let engine = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/datasets/d1/del-optical-image"))
            .respond_with(ResponseTemplate::new(200).set_body_string("detached"))
            .expect(1)
            .mount(&engine)
            .await;
        let ctx = TestContext::new(&engine)
            .with_dataset(TestDataset::new("d1", "owner@x.org").build())
            .build();

        let result = handle(
            ctx,
            DeleteOpticalImageCommand {
                dataset_id: "d1".to_string(),
                user: User::admin("root@x.org"),
            },
        )
        .await;
        assert_eq!(result.unwrap(), "detached");
    }

    #[tokio::test]
    async fn test_engine_failure_is_not_swallowed() {
        let engine = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/datasets/d1/del-optical-image"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no optical image"))
            .mount(&engine)
            .await;
        let ctx = TestContext::new(&engine)
            .with_dataset(TestDataset::new("d1", "owner@x.org").build())
            .build();

        let err = handle(
            ctx,
            DeleteOpticalImageCommand {
                dataset_id: "d1".to_string(),
                user: User::new("owner@x.org"),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MutationError::EngineRequestFailed { .. }));
    }
}
