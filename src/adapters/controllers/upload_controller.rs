use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use tracing::warn;

use crate::{
    adapters::{dto::upload_dto::UploadResponse, state::AppState},
    application::error::ApplicationError,
    domain::models::upload::{UploadFile, UploadMetadata},
};

pub struct UploadController;

impl UploadController {
    /// Token Consumer / Upload Gate.
    /// POST /upload with `Authorization: Bearer {token}` and a multipart
    /// body carrying the file plus sessionId and email fields.
    pub async fn upload_policy(
        State(app_state): State<AppState>,
        headers: HeaderMap,
        mut multipart: Multipart,
    ) -> Result<(StatusCode, Json<UploadResponse>), ApplicationError> {
        // Bearer token before multipart parsing (fail fast).
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|v| v.trim().to_string())
            .ok_or(ApplicationError::Unauthorized)?;

        let mut file_bytes: Option<Vec<u8>> = None;
        let mut filename: Option<String> = None;
        let mut mime_type: Option<String> = None;
        let mut session_id: Option<String> = None;
        let mut email: Option<String> = None;

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            warn!("Invalid multipart data: {}", e);
            ApplicationError::InvalidMetadata("Invalid request format".to_string())
        })? {
            let name = field.name().unwrap_or("").to_string();

            match name.as_str() {
                "file" => {
                    filename = field.file_name().map(|f| f.to_string());
                    mime_type = field.content_type().map(|c| c.to_string());
                    file_bytes = Some(
                        field
                            .bytes()
                            .await
                            .map_err(|e| {
                                warn!("Cannot read file bytes: {}", e);
                                ApplicationError::InvalidMetadata(
                                    "Invalid file data".to_string(),
                                )
                            })?
                            .to_vec(),
                    );
                }
                "sessionId" => {
                    session_id = Some(field.text().await.map_err(|e| {
                        warn!("Invalid sessionId field: {}", e);
                        ApplicationError::InvalidMetadata("Invalid request data".to_string())
                    })?);
                }
                "email" => {
                    email = Some(field.text().await.map_err(|e| {
                        warn!("Invalid email field: {}", e);
                        ApplicationError::InvalidMetadata("Invalid request data".to_string())
                    })?);
                }
                _ => {}
            }
        }

        let file_bytes = file_bytes.ok_or_else(|| {
            warn!("Missing required 'file' field in upload");
            ApplicationError::MissingFields("file".to_string())
        })?;

        let file = UploadFile::new(
            file_bytes,
            filename.unwrap_or_else(|| "policy.pdf".to_string()),
            mime_type.unwrap_or_default(),
        );
        let metadata = UploadMetadata {
            session_id: session_id.unwrap_or_default(),
            email: email.unwrap_or_default(),
        };

        let outcome = app_state.upload_service.consume(&token, file, metadata).await?;

        Ok((
            StatusCode::OK,
            Json(UploadResponse {
                success: true,
                message: "Document received and queued for analysis".to_string(),
                session_id: outcome.session_id,
            }),
        ))
    }
}
