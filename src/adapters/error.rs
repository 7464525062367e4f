use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::application::error::ApplicationError;

impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match self {
            ApplicationError::InvalidSession => {
                warn!("Rejected request with invalid session id");
                (StatusCode::BAD_REQUEST, "Invalid session ID", None)
            }
            ApplicationError::MissingFields(field) => {
                warn!("Missing required field: {}", field);
                (StatusCode::BAD_REQUEST, "Missing required fields", Some(field))
            }
            ApplicationError::StoreUnavailable(msg) => {
                error!("Token store unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "Token store unavailable", Some(msg))
            }
            ApplicationError::NotFound => {
                warn!("Resource not found");
                (StatusCode::NOT_FOUND, "Not found", None)
            }
            ApplicationError::Expired => {
                warn!("Token expired");
                (StatusCode::GONE, "Token expired", None)
            }
            ApplicationError::AlreadyUsed => {
                warn!("Token already used");
                (StatusCode::CONFLICT, "Token already used", None)
            }
            ApplicationError::Unauthorized => {
                warn!("Unauthorized access attempt");
                (StatusCode::UNAUTHORIZED, "Unauthorized", None)
            }
            ApplicationError::InvalidFileType(mime_type) => {
                warn!("Rejected upload with content type '{}'", mime_type);
                (
                    StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    "Only PDF files are accepted",
                    Some(mime_type),
                )
            }
            ApplicationError::FileTooLarge => {
                warn!("Rejected upload exceeding the size ceiling");
                (StatusCode::PAYLOAD_TOO_LARGE, "File exceeds the 2 MB limit", None)
            }
            ApplicationError::InvalidMetadata(msg) => {
                warn!("Invalid upload metadata: {}", msg);
                (StatusCode::BAD_REQUEST, "Invalid upload metadata", Some(msg))
            }
            ApplicationError::InvalidEmail => {
                warn!("Rejected upload with implausible email address");
                (StatusCode::BAD_REQUEST, "Invalid email address", None)
            }
            ApplicationError::ActionFailed(msg) => {
                error!("Document processing forward failed: {}", msg);
                (StatusCode::BAD_GATEWAY, "Document processing failed", Some(msg))
            }
            ApplicationError::InternalError(msg) => {
                error!("Internal server error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", Some(msg))
            }
        };

        let mut body = json!({
            "success": false,
            "error": error_message,
        });
        if let Some(details) = details {
            body["details"] = json!(details);
        }

        (status, Json(body)).into_response()
    }
}
