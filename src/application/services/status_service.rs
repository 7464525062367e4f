use async_trait::async_trait;

use crate::application::error::ApplicationError;

/// Flips the human-readable status on the persistent policy record.
/// Callers treat failures here as non-fatal to the upload flow.
#[async_trait]
pub trait PolicyStatusService: Send + Sync {
    async fn mark_processing(&self, session_id: &str) -> Result<(), ApplicationError>;
}
