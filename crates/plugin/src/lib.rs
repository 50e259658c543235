pub mod command;
pub mod error;
pub mod handler;

pub use command::{Command, FlowToken, SubOperation};
pub use error::{PluginError, PluginResult};
pub use handler::{Extension, Handler};
