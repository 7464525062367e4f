use std::future::Future;
use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    application::{
        error::ApplicationError,
        repositories::token_store::{ConsumeOutcome, TokenStore},
        services::{status_service::PolicyStatusService, workflow_service::WorkflowService},
    },
    domain::models::{
        token::{is_plausible_email, MOCK_TOKEN_PREFIX, TOKEN_TTL_SECONDS},
        upload::{UploadFile, UploadMetadata},
    },
};

#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub session_id: String,
}

/// Runs a post-success side effect whose failure must not fail the
/// request. The protected action already completed at that point, so the
/// user-visible result stays success; the gap is logged instead.
async fn best_effort<F>(context: &str, op: F)
where
    F: Future<Output = Result<(), ApplicationError>>,
{
    if let Err(e) = op.await {
        warn!("Best-effort step '{}' failed: {:?}", context, e);
    }
}

/// Token Consumer / Upload Gate.
///
/// A consume call moves through PRESENTED -> VALIDATED ->
/// ACTION_PERFORMED -> CONSUMED, failing out at each stage. The one
/// ordering guarantee that matters: the downstream forward is always
/// attempted before the used flag is written, so a failed forward never
/// burns the token.
pub struct UploadService {
    tokens: Arc<dyn TokenStore>,
    workflow: Arc<dyn WorkflowService>,
    status: Arc<dyn PolicyStatusService>,
    allow_mock_tokens: bool,
}

impl UploadService {
    pub fn new(
        tokens: Arc<dyn TokenStore>,
        workflow: Arc<dyn WorkflowService>,
        status: Arc<dyn PolicyStatusService>,
        allow_mock_tokens: bool,
    ) -> Self {
        Self {
            tokens,
            workflow,
            status,
            allow_mock_tokens,
        }
    }

    fn is_mock(&self, token: &str) -> bool {
        self.allow_mock_tokens && token.starts_with(MOCK_TOKEN_PREFIX)
    }

    pub async fn consume(
        &self,
        token: &str,
        file: UploadFile,
        metadata: UploadMetadata,
    ) -> Result<UploadOutcome, ApplicationError> {
        if token.is_empty() {
            return Err(ApplicationError::Unauthorized);
        }

        // Mock tokens skip store validation entirely. The bypass is gated
        // by a startup flag, never by the token value alone.
        let record = if self.is_mock(token) {
            info!("Accepting mock token, skipping store validation");
            None
        } else {
            let record = self
                .tokens
                .fetch_by_token(token)
                .await?
                .ok_or_else(|| {
                    warn!("Upload attempted with unknown token");
                    ApplicationError::Unauthorized
                })?;

            if record.used {
                warn!("Upload attempted with already-consumed token");
                return Err(ApplicationError::AlreadyUsed);
            }
            if record.is_expired() {
                warn!("Upload attempted with expired token");
                return Err(ApplicationError::Expired);
            }

            Some(record)
        };

        // Artifact and metadata checks come before the forward: a
        // rejected upload must leave no side effects anywhere.
        if file.content.is_empty() {
            return Err(ApplicationError::MissingFields("file".to_string()));
        }
        if !file.is_pdf() {
            return Err(ApplicationError::InvalidFileType(file.mime_type.clone()));
        }
        if !file.validate_size() {
            return Err(ApplicationError::FileTooLarge);
        }

        if metadata.session_id.is_empty() {
            return Err(ApplicationError::InvalidMetadata(
                "sessionId is required".to_string(),
            ));
        }
        if metadata.email.is_empty() {
            return Err(ApplicationError::InvalidMetadata(
                "email is required".to_string(),
            ));
        }
        if !is_plausible_email(&metadata.email) {
            return Err(ApplicationError::InvalidEmail);
        }

        // The protected action. Not retried; on failure the token stays
        // consumable so a transient downstream outage does not burn it.
        self.workflow.submit(&file, token, &metadata).await?;

        info!(
            "Document forwarded to processing workflow for session {}",
            metadata.session_id
        );

        if let Some(record) = record {
            let tokens = &self.tokens;
            best_effort("mark token used", async {
                match tokens
                    .mark_used(&record.token, &record.session_id, TOKEN_TTL_SECONDS)
                    .await?
                {
                    ConsumeOutcome::Consumed => Ok(()),
                    outcome => {
                        warn!(
                            "Used flag not updated after successful forward: {:?}",
                            outcome
                        );
                        Ok(())
                    }
                }
            })
            .await;
        }

        best_effort(
            "policy status update",
            self.status.mark_processing(&metadata.session_id),
        )
        .await;

        Ok(UploadOutcome {
            session_id: metadata.session_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{InMemoryTokenStore, MockStatus, MockWorkflow};
    use crate::domain::models::{
        token::TokenRecord,
        upload::{MAX_UPLOAD_BYTES, PDF_MIME_TYPE},
    };
    use chrono::{Duration, Utc};

    struct Harness {
        store: Arc<InMemoryTokenStore>,
        workflow: Arc<MockWorkflow>,
        status: Arc<MockStatus>,
        service: UploadService,
    }

    fn harness(allow_mock_tokens: bool) -> Harness {
        let store = Arc::new(InMemoryTokenStore::new());
        let workflow = Arc::new(MockWorkflow::new());
        let status = Arc::new(MockStatus::new());
        let service = UploadService::new(
            store.clone(),
            workflow.clone(),
            status.clone(),
            allow_mock_tokens,
        );
        Harness {
            store,
            workflow,
            status,
            service,
        }
    }

    async fn issue(store: &InMemoryTokenStore, token: &str, session_id: &str) {
        let record = TokenRecord::issue(
            token.to_string(),
            session_id.to_string(),
            Some("a@b.com".to_string()),
        );
        store.put_record(&record, TOKEN_TTL_SECONDS).await.unwrap();
    }

    fn pdf() -> UploadFile {
        UploadFile::new(
            vec![b'%'; 1024],
            "policy.pdf".to_string(),
            PDF_MIME_TYPE.to_string(),
        )
    }

    fn metadata() -> UploadMetadata {
        UploadMetadata {
            session_id: "cs_live_123".to_string(),
            email: "a@b.com".to_string(),
        }
    }

    #[tokio::test]
    async fn token_is_single_use() {
        let h = harness(false);
        issue(&h.store, "tok_abc", "cs_live_123").await;

        let first = h.service.consume("tok_abc", pdf(), metadata()).await;
        assert!(first.is_ok());
        assert_eq!(h.workflow.calls(), 1);

        let second = h.service.consume("tok_abc", pdf(), metadata()).await;
        assert!(matches!(second, Err(ApplicationError::AlreadyUsed)));
        assert_eq!(h.workflow.calls(), 1);
    }

    #[tokio::test]
    async fn consumption_flips_used_on_both_keys() {
        let h = harness(false);
        issue(&h.store, "tok_abc", "cs_live_123").await;

        h.service
            .consume("tok_abc", pdf(), metadata())
            .await
            .unwrap();

        let by_token = h.store.fetch_by_token("tok_abc").await.unwrap().unwrap();
        let by_session = h
            .store
            .fetch_by_session("cs_live_123")
            .await
            .unwrap()
            .unwrap();
        assert!(by_token.used);
        assert!(by_session.used);
        assert_eq!(by_token, by_session);
    }

    #[tokio::test]
    async fn downstream_failure_does_not_burn_the_token() {
        let h = harness(false);
        issue(&h.store, "tok_abc", "cs_live_123").await;
        h.workflow.fail_next(true);

        let first = h.service.consume("tok_abc", pdf(), metadata()).await;
        assert!(matches!(first, Err(ApplicationError::ActionFailed(_))));

        let record = h.store.fetch_by_token("tok_abc").await.unwrap().unwrap();
        assert!(!record.used);

        h.workflow.fail_next(false);
        let second = h.service.consume("tok_abc", pdf(), metadata()).await;
        assert!(second.is_ok());
        assert_eq!(h.workflow.calls(), 2);
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized_without_store_access() {
        let h = harness(false);

        let result = h.service.consume("", pdf(), metadata()).await;

        assert!(matches!(result, Err(ApplicationError::Unauthorized)));
        assert_eq!(h.store.accesses(), 0);
        assert_eq!(h.workflow.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_token_is_unauthorized() {
        let h = harness(false);

        let result = h.service.consume("tok_ghost", pdf(), metadata()).await;

        assert!(matches!(result, Err(ApplicationError::Unauthorized)));
        assert_eq!(h.workflow.calls(), 0);
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let h = harness(false);
        let mut record = TokenRecord::issue(
            "tok_abc".to_string(),
            "cs_live_123".to_string(),
            None,
        );
        record.expires = Utc::now() - Duration::minutes(1);
        h.store.put_record(&record, TOKEN_TTL_SECONDS).await.unwrap();

        let result = h.service.consume("tok_abc", pdf(), metadata()).await;

        assert!(matches!(result, Err(ApplicationError::Expired)));
        assert_eq!(h.workflow.calls(), 0);
    }

    #[tokio::test]
    async fn non_pdf_is_rejected_before_forwarding() {
        let h = harness(false);
        issue(&h.store, "tok_abc", "cs_live_123").await;

        let file = UploadFile::new(
            vec![0u8; 1024],
            "policy.docx".to_string(),
            "application/msword".to_string(),
        );
        let result = h.service.consume("tok_abc", file, metadata()).await;

        assert!(matches!(result, Err(ApplicationError::InvalidFileType(_))));
        assert_eq!(h.workflow.calls(), 0);

        let record = h.store.fetch_by_token("tok_abc").await.unwrap().unwrap();
        assert!(!record.used);
    }

    #[tokio::test]
    async fn oversized_file_is_rejected_before_forwarding() {
        let h = harness(false);
        issue(&h.store, "tok_abc", "cs_live_123").await;

        let file = UploadFile::new(
            vec![0u8; MAX_UPLOAD_BYTES as usize + 1],
            "policy.pdf".to_string(),
            PDF_MIME_TYPE.to_string(),
        );
        let result = h.service.consume("tok_abc", file, metadata()).await;

        assert!(matches!(result, Err(ApplicationError::FileTooLarge)));
        assert_eq!(h.workflow.calls(), 0);
    }

    #[tokio::test]
    async fn missing_metadata_is_rejected_before_forwarding() {
        let h = harness(false);
        issue(&h.store, "tok_abc", "cs_live_123").await;

        let no_session = UploadMetadata {
            session_id: String::new(),
            email: "a@b.com".to_string(),
        };
        let result = h.service.consume("tok_abc", pdf(), no_session).await;
        assert!(matches!(result, Err(ApplicationError::InvalidMetadata(_))));

        let bad_email = UploadMetadata {
            session_id: "cs_live_123".to_string(),
            email: "not-an-email".to_string(),
        };
        let result = h.service.consume("tok_abc", pdf(), bad_email).await;
        assert!(matches!(result, Err(ApplicationError::InvalidEmail)));

        assert_eq!(h.workflow.calls(), 0);
    }

    #[tokio::test]
    async fn mock_token_bypasses_store_when_enabled() {
        let h = harness(true);

        let result = h.service.consume("mock_demo", pdf(), metadata()).await;

        assert!(result.is_ok());
        assert_eq!(h.store.accesses(), 0);
        assert_eq!(h.workflow.calls(), 1);
    }

    #[tokio::test]
    async fn mock_prefix_gets_no_special_treatment_when_disabled() {
        let h = harness(false);

        let result = h.service.consume("mock_demo", pdf(), metadata()).await;

        assert!(matches!(result, Err(ApplicationError::Unauthorized)));
        assert_eq!(h.workflow.calls(), 0);
    }

    #[tokio::test]
    async fn used_flag_write_failure_still_reports_success() {
        let h = harness(false);
        issue(&h.store, "tok_abc", "cs_live_123").await;
        h.store.fail_mark_used(true);

        let result = h.service.consume("tok_abc", pdf(), metadata()).await;

        // Accepted asymmetric risk: the forward already completed.
        assert!(result.is_ok());
        let record = h.store.fetch_by_token("tok_abc").await.unwrap().unwrap();
        assert!(!record.used);
    }

    #[tokio::test]
    async fn status_update_failure_still_reports_success() {
        let h = harness(false);
        issue(&h.store, "tok_abc", "cs_live_123").await;
        h.status.fail_next(true);

        let result = h.service.consume("tok_abc", pdf(), metadata()).await;

        assert!(result.is_ok());
        assert_eq!(h.status.calls(), 1);
    }

    #[tokio::test]
    async fn status_update_runs_after_successful_forward() {
        let h = harness(false);
        issue(&h.store, "tok_abc", "cs_live_123").await;

        h.service
            .consume("tok_abc", pdf(), metadata())
            .await
            .unwrap();

        assert_eq!(h.status.calls(), 1);
    }
}
