use async_trait::async_trait;

use crate::{application::error::ApplicationError, domain::models::token::TokenRecord};

/// Result of the conditional used-flag update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// The flag flipped false -> true in this call.
    Consumed,
    /// The record existed but was already consumed.
    AlreadyUsed,
    /// No record under the token key (never issued or evicted by TTL).
    Missing,
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Writes the record under both `upload_token:{token}` and
    /// `payment:{sessionId}` with the given TTL. The two keys must
    /// always hold the same value.
    async fn put_record(
        &self,
        record: &TokenRecord,
        ttl_seconds: u64,
    ) -> Result<(), ApplicationError>;

    async fn fetch_by_token(&self, token: &str)
        -> Result<Option<TokenRecord>, ApplicationError>;

    async fn fetch_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<TokenRecord>, ApplicationError>;

    /// Atomically sets `used = true` on both keys iff it is currently
    /// false, refreshing the TTL. The check and the write happen in a
    /// single store-side step, so two racing consumers cannot both
    /// observe `used == false`.
    async fn mark_used(
        &self,
        token: &str,
        session_id: &str,
        ttl_seconds: u64,
    ) -> Result<ConsumeOutcome, ApplicationError>;

    /// Stores a processed-document id under `doc:{sessionId}` and
    /// `doc_payment:{sessionId}`.
    async fn put_document(
        &self,
        session_id: &str,
        document_id: &str,
        ttl_seconds: u64,
    ) -> Result<(), ApplicationError>;

    async fn fetch_document(
        &self,
        session_id: &str,
    ) -> Result<Option<String>, ApplicationError>;
}
