mod adapters;
mod application;
mod domain;
mod services;

use std::sync::Arc;

use adapters::{
    controllers::{
        health_controller::HealthController, token_controller::TokenController,
        upload_controller::UploadController,
    },
    middleware::validate_internal_secret,
    repositories::RedisTokenStore,
    state::AppState,
};
use application::{
    repositories::token_store::TokenStore,
    services::{
        token_service::TokenService, upload_service::UploadService, PolicyStatusService,
        WorkflowService,
    },
};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use domain::config::secrets::Secrets;
use services::{SupabaseStatusClient, WorkflowClient};
use tower_http::cors::{Any, CorsLayer};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let redis_url =
        std::env::var("REDIS_URL").expect("ERROR: REDIS_URL environment variable must be set");

    let workflow_endpoint = std::env::var("WORKFLOW_ENDPOINT")
        .expect("ERROR: WORKFLOW_ENDPOINT environment variable must be set");
    let workflow_api_key = std::env::var("WORKFLOW_API_KEY").ok();

    let supabase_url = std::env::var("SUPABASE_URL")
        .expect("ERROR: SUPABASE_URL environment variable must be set");
    let supabase_service_key = std::env::var("SUPABASE_SERVICE_KEY")
        .expect("ERROR: SUPABASE_SERVICE_KEY environment variable must be set");

    let internal_secret = std::env::var("INTERNAL_API_SECRET")
        .expect("ERROR: INTERNAL_API_SECRET environment variable must be set");

    // Off by default: mock tokens weaken the store-validated invariant
    // and belong to test/demo deployments only.
    let allow_mock_tokens = std::env::var("ALLOW_MOCK_TOKENS")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);
    if allow_mock_tokens {
        tracing::warn!("Mock-token bypass is ENABLED; uploads with mock tokens skip store validation");
    }

    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse::<u16>()
        .expect("PORT must be a valid u16");

    // Configure CORS
    let cors = if let Ok(allowed_origins) = std::env::var("CORS_ALLOWED_ORIGINS") {
        let origins: Vec<_> = allowed_origins
            .split(',')
            .map(|s| s.trim().parse().expect("Invalid CORS origin"))
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Allow all origins if not specified (only for development)
        CorsLayer::permissive()
    };

    // The store holds only a client handle; connections are opened per
    // request and released on every exit path.
    let redis_client = redis::Client::open(redis_url.as_str())
        .expect("ERROR: Failed to create Redis client. Check REDIS_URL format.");
    let token_store = Arc::new(RedisTokenStore::new(redis_client)) as Arc<dyn TokenStore>;

    let workflow = Arc::new(WorkflowClient::new(workflow_endpoint, workflow_api_key))
        as Arc<dyn WorkflowService>;
    let status = Arc::new(SupabaseStatusClient::new(supabase_url, supabase_service_key))
        as Arc<dyn PolicyStatusService>;

    let app_state = AppState {
        secrets: Arc::new(Secrets { internal_secret }),
        token_service: Arc::new(TokenService::new(token_store.clone())),
        upload_service: Arc::new(UploadService::new(
            token_store,
            workflow,
            status,
            allow_mock_tokens,
        )),
    };

    // Issuance is triggered by the payment webhook handler, never by
    // end users, so /store sits behind the internal-secret check.
    let internal_routes = Router::new()
        .route("/store", post(TokenController::store_token))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            validate_internal_secret,
        ));

    let public_routes = Router::new()
        .route("/health", get(HealthController::health_check))
        .route("/verify", get(TokenController::verify_session))
        .route("/verify-token", post(TokenController::verify_token))
        .route("/upload", post(UploadController::upload_policy))
        // 2 MiB file plus multipart framing and metadata fields.
        .layer(DefaultBodyLimit::max(4 * 1024 * 1024));

    let router = Router::new()
        .merge(internal_routes)
        .merge(public_routes)
        .fallback(|| async { application::error::ApplicationError::NotFound })
        .layer(cors)
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .expect("Failed to bind to port");

    tracing::info!("Server listening on 0.0.0.0:{}", port);

    axum::serve(listener, router)
        .await
        .expect("Failed to start server");
}
