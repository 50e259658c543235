pub mod code;
pub mod error;
pub mod family;
pub mod path;
pub mod payload;
pub mod scope;
pub mod stage;

// Re-export commonly used types
pub use code::ResultCode;
pub use error::{ApiError, ApiResult};
pub use family::{CommandId, Family};
pub use path::ScopePath;
pub use payload::Payload;
pub use scope::{ScopePriority, WorkspaceLayout};
pub use stage::Stage;
