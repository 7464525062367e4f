use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

use crate::domain::config::secrets::Secrets;

/// Middleware to validate the X-Internal-Secret header on routes only
/// the payment webhook handler should reach.
pub async fn validate_internal_secret(
    State(secrets): State<Arc<Secrets>>,
    headers: HeaderMap,
    request: Request<Body>,
    next: Next,
) -> Response {
    match headers.get("X-Internal-Secret") {
        Some(header_value) => match header_value.to_str() {
            Ok(provided_secret) => {
                if provided_secret == secrets.internal_secret {
                    next.run(request).await
                } else {
                    warn!("Invalid secret provided in X-Internal-Secret header");
                    (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
                }
            }
            Err(_) => {
                warn!("X-Internal-Secret header contains invalid UTF-8");
                (StatusCode::BAD_REQUEST, "Bad request").into_response()
            }
        },
        None => {
            warn!("X-Internal-Secret header is missing");
            (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
        }
    }
}
