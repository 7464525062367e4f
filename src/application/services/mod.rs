pub mod status_service;
pub mod token_service;
pub mod upload_service;
pub mod workflow_service;

pub use status_service::PolicyStatusService;
pub use workflow_service::WorkflowService;
