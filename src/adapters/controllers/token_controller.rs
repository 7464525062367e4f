use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use tracing::{info, warn};

use crate::{
    adapters::{
        dto::token_dto::{
            SessionQuery, SessionStatusResponse, StoreTokenRequest, StoreTokenResponse,
            VerifyTokenRequest, VerifyTokenResponse,
        },
        state::AppState,
    },
    application::{error::ApplicationError, services::token_service::SessionLookup},
};

pub struct TokenController;

impl TokenController {
    /// Token Issuer.
    /// POST /store (internal, called by the payment webhook handler)
    pub async fn store_token(
        State(app_state): State<AppState>,
        Json(body): Json<StoreTokenRequest>,
    ) -> Result<(StatusCode, Json<StoreTokenResponse>), ApplicationError> {
        // The wire contract carries the full record shape; presence is
        // validated here, canonical values are computed by the service.
        let token = body
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApplicationError::MissingFields("token".to_string()))?;
        let session_id = body
            .session_id
            .ok_or_else(|| ApplicationError::MissingFields("sessionId".to_string()))?;
        if body.created.is_none() {
            return Err(ApplicationError::MissingFields("created".to_string()));
        }
        if body.expires.is_none() {
            return Err(ApplicationError::MissingFields("expires".to_string()));
        }
        if body.used == Some(true) {
            // The flag only ever flips through consumption.
            warn!("Ignoring used=true on an issuance request");
        }

        app_state
            .token_service
            .issue(&session_id, &token, body.customer_email, body.document_id)
            .await?;

        Ok((StatusCode::CREATED, Json(StoreTokenResponse { success: true })))
    }

    /// Token Verifier. Read-only: safe to call any number of times.
    /// POST /verify-token
    pub async fn verify_token(
        State(app_state): State<AppState>,
        Json(body): Json<VerifyTokenRequest>,
    ) -> Result<Json<VerifyTokenResponse>, ApplicationError> {
        let token = body
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApplicationError::MissingFields("token".to_string()))?;

        let verdict = app_state.token_service.verify(&token).await?;

        Ok(Json(VerifyTokenResponse {
            valid: verdict.valid,
            customer_email: verdict.customer_email,
            reason: verdict.reason.map(|r| r.as_str()),
        }))
    }

    /// Payment-Session Correlator: polled by clients that only know
    /// their payment session. Absence is "pending", not an error.
    /// GET /verify?sessionId=
    pub async fn verify_session(
        State(app_state): State<AppState>,
        Query(query): Query<SessionQuery>,
    ) -> Result<Json<SessionStatusResponse>, ApplicationError> {
        let session_id = query
            .session_id
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApplicationError::MissingFields("sessionId".to_string()))?;

        let lookup = app_state.token_service.lookup_by_session(&session_id).await?;

        let response = match lookup {
            SessionLookup::Pending => SessionStatusResponse::pending(),
            SessionLookup::Issued {
                record,
                document_id,
            } => {
                info!("Session {} has an issued token", session_id);
                SessionStatusResponse {
                    success: true,
                    status: "success",
                    token: Some(record.token),
                    customer_email: record.customer_email,
                    used: Some(record.used),
                    document_id,
                }
            }
        };

        Ok(Json(response))
    }
}
