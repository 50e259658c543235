pub mod bus;
pub mod config;
pub mod error;
pub mod extension;
pub mod group;
pub mod logging;
pub mod pipeline;

pub use bus::{Bus, StageBus};
pub use config::{PipelineConfig, PipelineSettings};
pub use error::{KernelError, Result};
pub use extension::ExtensionDispatcher;
pub use group::HandlerGroup;
pub use pipeline::{DispatchOutcome, DispatchPhase, LoadOptions, Pipeline};
