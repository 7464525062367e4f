#[derive(Debug)]
pub enum ApplicationError {
    InvalidSession,
    MissingFields(String),
    StoreUnavailable(String),
    NotFound,
    Expired,
    AlreadyUsed,
    Unauthorized,
    InvalidFileType(String),
    FileTooLarge,
    InvalidMetadata(String),
    InvalidEmail,
    ActionFailed(String),
    InternalError(String),
}
