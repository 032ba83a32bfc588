//! Edit permission checks

use async_trait::async_trait;
use sm_common::User;
use std::sync::Arc;

use crate::error::{MutationError, MutationResult};
use crate::store::DatasetStore;

/// Capability check run before any other mutation step
#[async_trait]
pub trait EditPermission: Send + Sync {
    /// Fail with `Forbidden` (or `NotFound`) unless `user` may edit the dataset
    async fn assert_can_edit(&self, dataset_id: &str, user: &User) -> MutationResult<()>;
}

/// Admins may edit any dataset; everyone else only their own submissions
#[derive(Clone)]
pub struct SubmitterPolicy {
    store: Arc<dyn DatasetStore>,
}

impl SubmitterPolicy {
    pub fn new(store: Arc<dyn DatasetStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EditPermission for SubmitterPolicy {
    async fn assert_can_edit(&self, dataset_id: &str, user: &User) -> MutationResult<()> {
        if user.is_admin() {
            return Ok(());
        }

        let dataset = self
            .store
            .fetch(dataset_id)
            .await?
            .ok_or_else(|| MutationError::NotFound(dataset_id.to_string()))?;

        if dataset.submitter_email() == Some(user.email.as_str()) {
            Ok(())
        } else {
            tracing::warn!(
                dataset_id = %dataset_id,
                user = %user.email,
                "Edit denied"
            );
            Err(MutationError::Forbidden {
                dataset_id: dataset_id.to_string(),
            })
        }
    }
}
