use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Closed payload type carried by a command.
///
/// Each family's payload shape is a variant of this enum, so a handler
/// recovers its concrete request by matching instead of downcasting. A
/// command derived for a follow-up stage reuses the originating payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    #[default]
    None,
    Compile(CompileRequest),
    Lint(LintRequest),
    Install(InstallRequest),
    ProjectGen(ProjectGenRequest),
}

/// Compile/link/package request for one build unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompileRequest {
    pub unit: String,
    pub configuration: String,
    pub defines: Vec<String>,
}

/// Lint request for the sources under the command's target path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LintRequest {
    pub language: String,
    pub rule_set: Option<String>,
}

/// Package install/remove request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstallRequest {
    pub package: String,
    pub version: Option<String>,
    pub remove: bool,
}

/// IDE project-file generation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectGenRequest {
    pub generator: String,
    pub output_dir: PathBuf,
}
