mod error;
mod supabase_status;
mod workflow_client;

pub use error::UpstreamError;
pub use supabase_status::SupabaseStatusClient;
pub use workflow_client::WorkflowClient;
