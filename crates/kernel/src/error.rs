use railyard_api::Family;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KernelError {
    #[error("handler family {handler} does not match group family {group}")]
    FamilyMismatch { handler: Family, group: Family },
    #[error("registry lock poisoned: {0}")]
    Poisoned(&'static str),
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
    #[error(transparent)]
    Api(#[from] railyard_api::ApiError),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, KernelError>;
