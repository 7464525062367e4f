use async_trait::async_trait;

use crate::{
    application::error::ApplicationError,
    domain::models::upload::{UploadFile, UploadMetadata},
};

/// The protected action behind the upload gate: hand the policy document
/// to the downstream processing workflow. Success is judged solely by the
/// HTTP status of the forward; the call is never retried.
#[async_trait]
pub trait WorkflowService: Send + Sync {
    async fn submit(
        &self,
        file: &UploadFile,
        token: &str,
        metadata: &UploadMetadata,
    ) -> Result<(), ApplicationError>;
}
