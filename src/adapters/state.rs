use axum::extract::FromRef;
use std::sync::Arc;

use crate::{
    application::services::{token_service::TokenService, upload_service::UploadService},
    domain::config::secrets::Secrets,
};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub secrets: Arc<Secrets>,
    pub token_service: Arc<TokenService>,
    pub upload_service: Arc<UploadService>,
}
