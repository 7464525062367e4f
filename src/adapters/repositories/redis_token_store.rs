use async_trait::async_trait;
use redis::AsyncCommands;

use crate::{
    application::{
        error::ApplicationError,
        repositories::token_store::{ConsumeOutcome, TokenStore},
    },
    domain::models::token::{
        doc_key, doc_payment_key, payment_key, upload_token_key, TokenRecord,
    },
};

/// Compare-and-set on the used flag, server-side. Checking and flipping
/// in one script closes the check-then-act window between two racing
/// consumers; both keys are rewritten in the same step so they never
/// diverge.
const CONSUME_SCRIPT: &str = r#"
local raw = redis.call('GET', KEYS[1])
if not raw then
  return 'missing'
end
local record = cjson.decode(raw)
if record['used'] then
  return 'already_used'
end
record['used'] = true
local updated = cjson.encode(record)
redis.call('SET', KEYS[1], updated, 'EX', tonumber(ARGV[1]))
redis.call('SET', KEYS[2], updated, 'EX', tonumber(ARGV[1]))
return 'consumed'
"#;

/// Redis-backed token store. Holds only a client handle; every operation
/// opens its own connection and releases it when the call returns,
/// whichever way it exits.
pub struct RedisTokenStore {
    client: redis::Client,
}

impl RedisTokenStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    async fn connection(
        &self,
    ) -> Result<redis::aio::MultiplexedConnection, ApplicationError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                ApplicationError::StoreUnavailable(format!(
                    "Failed to connect to token store: {}",
                    e
                ))
            })
    }

    fn store_err(e: redis::RedisError) -> ApplicationError {
        ApplicationError::StoreUnavailable(format!("Token store error: {}", e))
    }

    fn decode(raw: Option<String>) -> Result<Option<TokenRecord>, ApplicationError> {
        raw.map(|value| {
            serde_json::from_str(&value).map_err(|e| {
                ApplicationError::InternalError(format!("Corrupt token record: {}", e))
            })
        })
        .transpose()
    }
}

#[async_trait]
impl TokenStore for RedisTokenStore {
    async fn put_record(
        &self,
        record: &TokenRecord,
        ttl_seconds: u64,
    ) -> Result<(), ApplicationError> {
        let payload = serde_json::to_string(record)
            .map_err(|e| ApplicationError::InternalError(e.to_string()))?;

        let mut conn = self.connection().await?;

        // Both keys land in one pipelined round trip.
        let _: () = redis::pipe()
            .set_ex(upload_token_key(&record.token), &payload, ttl_seconds)
            .set_ex(payment_key(&record.session_id), &payload, ttl_seconds)
            .query_async(&mut conn)
            .await
            .map_err(Self::store_err)?;

        Ok(())
    }

    async fn fetch_by_token(
        &self,
        token: &str,
    ) -> Result<Option<TokenRecord>, ApplicationError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn
            .get(upload_token_key(token))
            .await
            .map_err(Self::store_err)?;
        Self::decode(raw)
    }

    async fn fetch_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<TokenRecord>, ApplicationError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn
            .get(payment_key(session_id))
            .await
            .map_err(Self::store_err)?;
        Self::decode(raw)
    }

    async fn mark_used(
        &self,
        token: &str,
        session_id: &str,
        ttl_seconds: u64,
    ) -> Result<ConsumeOutcome, ApplicationError> {
        let mut conn = self.connection().await?;

        let outcome: String = redis::Script::new(CONSUME_SCRIPT)
            .key(upload_token_key(token))
            .key(payment_key(session_id))
            .arg(ttl_seconds)
            .invoke_async(&mut conn)
            .await
            .map_err(Self::store_err)?;

        match outcome.as_str() {
            "consumed" => Ok(ConsumeOutcome::Consumed),
            "already_used" => Ok(ConsumeOutcome::AlreadyUsed),
            "missing" => Ok(ConsumeOutcome::Missing),
            other => Err(ApplicationError::InternalError(format!(
                "Unexpected consume script result: {}",
                other
            ))),
        }
    }

    async fn put_document(
        &self,
        session_id: &str,
        document_id: &str,
        ttl_seconds: u64,
    ) -> Result<(), ApplicationError> {
        let mut conn = self.connection().await?;

        let _: () = redis::pipe()
            .set_ex(doc_key(session_id), document_id, ttl_seconds)
            .set_ex(doc_payment_key(session_id), document_id, ttl_seconds)
            .query_async(&mut conn)
            .await
            .map_err(Self::store_err)?;

        Ok(())
    }

    async fn fetch_document(
        &self,
        session_id: &str,
    ) -> Result<Option<String>, ApplicationError> {
        let mut conn = self.connection().await?;
        conn.get(doc_key(session_id)).await.map_err(Self::store_err)
    }
}
