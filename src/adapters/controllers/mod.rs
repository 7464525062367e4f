pub mod health_controller;
pub mod token_controller;
pub mod upload_controller;
