use mediator::Request;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sm_common::User;

use crate::engine::{AddOpticalImageRequest, EngineRoute};
use crate::error::{MutationError, MutationResult};
use crate::features::MutationContext;

/// Attach an optical image to a dataset
///
/// `image_url` may be an absolute path on the image storage service, in
/// which case it is resolved against the configured storage base URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddOpticalImageCommand {
    pub dataset_id: String,
    pub image_url: String,
    /// Image-to-dataset transform, passed to the engine untouched
    #[serde(default)]
    pub transform: Value,
    pub user: User,
}

impl Request<Result<String, MutationError>> for AddOpticalImageCommand {}

fn resolve_image_url(base_url: &str, image_url: &str) -> String {
    if image_url.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), image_url)
    } else {
        image_url.to_string()
    }
}

#[tracing::instrument(skip(ctx, command), fields(dataset_id = %command.dataset_id, user = %command.user.email))]
pub async fn handle(ctx: MutationContext, command: AddOpticalImageCommand) -> MutationResult<String> {
    let _guard = ctx.locks.acquire(&command.dataset_id).await;

    add_optical_image(&ctx, &command).await.inspect_err(|e| {
        tracing::error!(error = %e, kind = e.kind(), "Adding optical image failed");
    })
}

async fn add_optical_image(
    ctx: &MutationContext,
    command: &AddOpticalImageCommand,
) -> MutationResult<String> {
    let id = &command.dataset_id;
    ctx.permissions.assert_can_edit(id, &command.user).await?;

    let url = resolve_image_url(&ctx.image_storage_url, &command.image_url);
    let body = AddOpticalImageRequest {
        url: &url,
        transform: &command.transform,
    };
    ctx.engine
        .send(Some(id.as_str()), &EngineRoute::AddOpticalImage(id.clone()), &body)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::*;
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    #[test]
    fn test_resolve_image_url() {
        assert_eq!(
            resolve_image_url("http://img:4201/", "/optical_images/abc"),
            "http://img:4201/optical_images/abc"
        );
        assert_eq!(
            resolve_image_url("http://img:4201", "https://cdn.example.org/abc.png"),
            "https://cdn.example.org/abc.png"
        );
    }

    #[tokio::test]
    async fn test_relative_url_is_resolved_before_sending() {
        let engine = MockServer::start().await;
        let transform = json!([[1, 0, 0], [0, 1, 0], [0, 0, 1]]);
        Mock::given(method("POST"))
            .and(path("/v1/datasets/d1/add-optical-image"))
            .and(body_json(json!({
                "url": format!("{IMAGE_STORAGE_URL}/optical_images/abc"),
                "transform": transform,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string("attached"))
            .expect(1)
            .mount(&engine)
            .await;
        let ctx = TestContext::new(&engine)
            .with_dataset(TestDataset::new("d1", "owner@x.org").build())
            .build();

        let result = handle(
            ctx,
            AddOpticalImageCommand {
                dataset_id: "d1".to_string(),
                image_url: "/optical_images/abc".to_string(),
                transform,
                user: User::new("owner@x.org"),
            },
        )
        .await
        .unwrap();
        assert_eq!(result, "attached");
    }

    #[tokio::test]
    async fn test_missing_dataset_is_not_found() {
        let engine = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&engine)
            .await;
        let ctx = TestContext::new(&engine).build();

        let err = handle(
            ctx,
            AddOpticalImageCommand {
                dataset_id: "nope".to_string(),
                image_url: "/optical_images/abc".to_string(),
                transform: Value::Null,
                user: User::new("owner@x.org"),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MutationError::NotFound(_)));
    }
}
