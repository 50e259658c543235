#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unknown family: {0}")]
    UnknownFamily(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
