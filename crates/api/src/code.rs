use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome code of one asynchronous sub-operation, and of the aggregate a
/// command reduces its sub-operations to. Zero is success; everything else is
/// a tool-specific failure code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultCode(pub i32);

impl ResultCode {
    pub const SUCCESS: ResultCode = ResultCode(0);

    /// Generic failure reported when a sub-operation faulted or was cancelled
    /// and no tool-specific code is available.
    pub const FAILURE: ResultCode = ResultCode(1);

    pub const fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl Default for ResultCode {
    fn default() -> Self {
        Self::SUCCESS
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for ResultCode {
    fn from(code: i32) -> Self {
        Self(code)
    }
}
