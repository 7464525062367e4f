use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    application::{error::ApplicationError, repositories::token_store::TokenStore},
    domain::models::token::{is_live_session, TokenRecord, TOKEN_TTL_SECONDS},
};

/// Why a verification failed. Verification never mutates the record, so
/// these are verdicts rather than errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NotFound,
    Expired,
    AlreadyUsed,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::NotFound => "not_found",
            RejectReason::Expired => "expired",
            RejectReason::AlreadyUsed => "already_used",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerifyVerdict {
    pub valid: bool,
    pub customer_email: Option<String>,
    pub reason: Option<RejectReason>,
}

impl VerifyVerdict {
    fn valid(customer_email: Option<String>) -> Self {
        Self {
            valid: true,
            customer_email,
            reason: None,
        }
    }

    fn rejected(reason: RejectReason) -> Self {
        Self {
            valid: false,
            customer_email: None,
            reason: Some(reason),
        }
    }
}

/// What a polling client learns about its payment session.
#[derive(Debug, Clone)]
pub enum SessionLookup {
    /// No record yet. Not an error: the client polls until issuance.
    Pending,
    Issued {
        record: TokenRecord,
        document_id: Option<String>,
    },
}

/// Token Issuer, Token Verifier and Payment-Session Correlator over a
/// [`TokenStore`].
pub struct TokenService {
    store: Arc<dyn TokenStore>,
}

impl TokenService {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Persists a fresh record for a completed payment session under both
    /// lookup keys. Session ids that do not match the live-session prefix
    /// are rejected before any store access.
    pub async fn issue(
        &self,
        session_id: &str,
        token: &str,
        customer_email: Option<String>,
        document_id: Option<String>,
    ) -> Result<(), ApplicationError> {
        if !is_live_session(session_id) {
            warn!("Rejecting token issuance for non-live session id");
            return Err(ApplicationError::InvalidSession);
        }
        if token.is_empty() {
            return Err(ApplicationError::MissingFields("token".to_string()));
        }

        // Overwriting a consumed session record is allowed (a customer can
        // pay again), but never silently.
        if let Some(existing) = self.store.fetch_by_session(session_id).await? {
            if existing.used {
                warn!(
                    "Issuing new token for session {} whose previous token was already consumed",
                    session_id
                );
            }
        }

        let record = TokenRecord::issue(
            token.to_string(),
            session_id.to_string(),
            customer_email,
        );
        self.store.put_record(&record, TOKEN_TTL_SECONDS).await?;

        if let Some(document_id) = document_id {
            self.store
                .put_document(session_id, &document_id, TOKEN_TTL_SECONDS)
                .await?;
        }

        info!("Issued upload token for session {}", session_id);
        Ok(())
    }

    /// Read-only validity check. Idempotent: callable any number of times
    /// without flipping `used`, which is what allows client-side polling.
    pub async fn verify(&self, token: &str) -> Result<VerifyVerdict, ApplicationError> {
        let Some(record) = self.store.fetch_by_token(token).await? else {
            return Ok(VerifyVerdict::rejected(RejectReason::NotFound));
        };

        // Expiry wins over the used flag: a stale record is reported as
        // expired regardless of whether it was consumed first.
        if record.is_expired() {
            return Ok(VerifyVerdict::rejected(RejectReason::Expired));
        }
        if record.used {
            return Ok(VerifyVerdict::rejected(RejectReason::AlreadyUsed));
        }

        Ok(VerifyVerdict::valid(record.customer_email))
    }

    /// The join point between the payment flow and the token flow: a
    /// client that only knows its payment session discovers here whether
    /// a token has been issued yet.
    pub async fn lookup_by_session(
        &self,
        session_id: &str,
    ) -> Result<SessionLookup, ApplicationError> {
        if !is_live_session(session_id) {
            warn!("Rejecting session lookup for non-live session id");
            return Err(ApplicationError::InvalidSession);
        }

        match self.store.fetch_by_session(session_id).await? {
            None => Ok(SessionLookup::Pending),
            Some(record) => {
                let document_id = self.store.fetch_document(session_id).await?;
                Ok(SessionLookup::Issued {
                    record,
                    document_id,
                })
            }
        }
    }
}
