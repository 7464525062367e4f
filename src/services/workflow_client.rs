use async_trait::async_trait;
use reqwest::{multipart, Client};

use crate::{
    application::{error::ApplicationError, services::WorkflowService},
    domain::models::upload::{UploadFile, UploadMetadata},
    services::error::UpstreamError,
};

/// Forwards policy documents to the document-processing workflow over
/// HTTP. One attempt per upload; the caller decides what a failure means
/// for the token.
pub struct WorkflowClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl WorkflowClient {
    pub fn new(endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl WorkflowService for WorkflowClient {
    async fn submit(
        &self,
        file: &UploadFile,
        token: &str,
        metadata: &UploadMetadata,
    ) -> Result<(), ApplicationError> {
        let file_part = multipart::Part::bytes(file.content.clone())
            .file_name(file.filename.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| UpstreamError::InternalError(e.to_string()))?;

        let form = multipart::Form::new()
            .part("file", file_part)
            .text("token", token.to_string())
            .text("sessionId", metadata.session_id.clone())
            .text("email", metadata.email.clone());

        let mut request = self.client.post(&self.endpoint).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await.map_err(UpstreamError::from)?;

        // Success is judged solely by the HTTP status.
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Rejected(format!(
                "Workflow returned {}: {}",
                status, error_text
            ))
            .into());
        }

        Ok(())
    }
}
