use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("tool invocation failed: {0}")]
    Tool(String),
    #[error("unsupported payload for this handler: {0}")]
    UnsupportedPayload(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<Box<dyn std::error::Error + Send + Sync>> for PluginError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        PluginError::Internal(err.to_string())
    }
}

pub type PluginResult<T> = std::result::Result<T, PluginError>;
