use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lifetime of every token and session record in the store, in seconds.
pub const TOKEN_TTL_SECONDS: u64 = 1800;

/// Live checkout sessions from the payment provider carry this prefix.
/// Session ids without it are rejected before any store access.
pub const LIVE_SESSION_PREFIX: &str = "cs_live_";

/// Tokens with this prefix skip store validation, but only when the
/// service was started with mock tokens explicitly enabled.
pub const MOCK_TOKEN_PREFIX: &str = "mock_";

pub fn upload_token_key(token: &str) -> String {
    format!("upload_token:{}", token)
}

pub fn payment_key(session_id: &str) -> String {
    format!("payment:{}", session_id)
}

pub fn doc_key(session_id: &str) -> String {
    format!("doc:{}", session_id)
}

pub fn doc_payment_key(session_id: &str) -> String {
    format!("doc_payment:{}", session_id)
}

pub fn is_live_session(session_id: &str) -> bool {
    session_id.starts_with(LIVE_SESSION_PREFIX)
}

/// Minimal syntactic check: non-empty local part and a dotted domain.
/// Anything stricter belongs to the downstream workflow, not this gate.
pub fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// The single persisted entity of the token subsystem. Stored as JSON
/// under both `upload_token:{token}` and `payment:{sessionId}`, which
/// must always hold the same value.
///
/// `used` is a JSON boolean and flips false -> true exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub token: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "customerEmail", skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
    pub used: bool,
}

impl TokenRecord {
    /// Builds a fresh record: `used = false`, `created = now`,
    /// `expires = now + TOKEN_TTL_SECONDS`.
    pub fn issue(token: String, session_id: String, customer_email: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            token,
            session_id,
            customer_email,
            created: now,
            expires: now + Duration::seconds(TOKEN_TTL_SECONDS as i64),
            used: false,
        }
    }

    /// Wall-clock expiry check, independent of the store's own TTL eviction.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}
