/// Size ceiling for a policy illustration upload.
pub const MAX_UPLOAD_BYTES: u64 = 2 * 1024 * 1024;

/// The only content type the upload gate accepts.
pub const PDF_MIME_TYPE: &str = "application/pdf";

#[derive(Debug, Clone)]
pub struct UploadFile {
    pub content: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
}

impl UploadFile {
    pub fn new(content: Vec<u8>, filename: String, mime_type: String) -> Self {
        Self {
            content,
            filename,
            mime_type,
        }
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == PDF_MIME_TYPE
    }

    pub fn validate_size(&self) -> bool {
        self.size() <= MAX_UPLOAD_BYTES
    }
}

/// Caller-supplied upload metadata. Required by the downstream workflow
/// and takes precedence over whatever email the token record carries.
#[derive(Debug, Clone)]
pub struct UploadMetadata {
    pub session_id: String,
    pub email: String,
}
