use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of POST /store, sent by the payment webhook handler. The caller
/// supplies the full record shape; the service recomputes the canonical
/// timestamps and forces `used` to false.
#[derive(Debug, Deserialize)]
pub struct StoreTokenRequest {
    pub token: Option<String>,
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
    #[serde(rename = "customerEmail")]
    pub customer_email: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub expires: Option<DateTime<Utc>>,
    #[serde(default)]
    pub used: Option<bool>,
    #[serde(rename = "documentId")]
    pub document_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StoreTokenResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct VerifyTokenRequest {
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyTokenResponse {
    pub valid: bool,
    #[serde(rename = "customerEmail", skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub success: bool,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(rename = "customerEmail", skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used: Option<bool>,
    #[serde(rename = "documentId", skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

impl SessionStatusResponse {
    pub fn pending() -> Self {
        Self {
            success: true,
            status: "pending",
            token: None,
            customer_email: None,
            used: None,
            document_id: None,
        }
    }
}
