use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::{
    application::{error::ApplicationError, services::PolicyStatusService},
    services::error::UpstreamError,
};

/// Updates the policy record's status through the Supabase REST API.
/// The upload flow treats this as best-effort.
pub struct SupabaseStatusClient {
    client: Client,
    rest_url: String,
    api_key: String,
}

impl SupabaseStatusClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            rest_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
            api_key,
        }
    }
}

#[async_trait]
impl PolicyStatusService for SupabaseStatusClient {
    async fn mark_processing(&self, session_id: &str) -> Result<(), ApplicationError> {
        let url = format!(
            "{}/policies?session_id=eq.{}",
            self.rest_url, session_id
        );

        let response = self
            .client
            .patch(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Prefer", "return=minimal")
            .json(&json!({ "status": "processing" }))
            .send()
            .await
            .map_err(UpstreamError::from)
            .map_err(|e| ApplicationError::InternalError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ApplicationError::InternalError(format!(
                "Status update failed with status: {}",
                response.status()
            )));
        }

        Ok(())
    }
}
