use crate::path::ScopePath;
use serde::{Deserialize, Serialize};

/// The two well-known roots scope priorities are computed against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceLayout {
    pub sdk_root: ScopePathDef,
    pub project_root: ScopePathDef,
}

/// Serde-friendly path wrapper for layout files.
pub type ScopePathDef = std::path::PathBuf;

impl WorkspaceLayout {
    pub fn new(sdk_root: impl Into<ScopePathDef>, project_root: impl Into<ScopePathDef>) -> Self {
        Self {
            sdk_root: sdk_root.into(),
            project_root: project_root.into(),
        }
    }

    pub fn sdk_scope(&self) -> ScopePath {
        ScopePath::new(&self.sdk_root)
    }

    pub fn project_scope(&self) -> ScopePath {
        ScopePath::new(&self.project_root)
    }
}

const SDK_ROOT: u8 = 1 << 0;
const PROJECT_ROOT: u8 = 1 << 1;
const LOCAL_OVERRIDE: u8 = 1 << 2;

/// Bit-packed handler rank used by locality resolution.
///
/// One bit records which well-known root the handler's scope belongs to, one
/// bit records whether the scope is strictly narrower than that root (a local
/// override). The ordering is the total order over the packed byte, which
/// puts overrides above root-wide handlers and the zero default below
/// everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopePriority(u8);

impl ScopePriority {
    /// Rank a handler scope against the workspace layout.
    ///
    /// A scope under the project root outranks one under the SDK root, and a
    /// scope strictly narrower than its root outranks the root-wide default
    /// of the same family.
    pub fn for_scope(scope: &ScopePath, layout: &WorkspaceLayout) -> Self {
        let project = layout.project_scope();
        if project.contains(scope) {
            let mut bits = PROJECT_ROOT;
            if project.strictly_contains(scope) {
                bits |= LOCAL_OVERRIDE;
            }
            return Self(bits);
        }

        let sdk = layout.sdk_scope();
        let mut bits = SDK_ROOT;
        if sdk.strictly_contains(scope) {
            bits |= LOCAL_OVERRIDE;
        }
        Self(bits)
    }

    pub const fn is_local_override(self) -> bool {
        self.0 & LOCAL_OVERRIDE != 0
    }

    pub const fn is_project_scoped(self) -> bool {
        self.0 & PROJECT_ROOT != 0
    }

    pub const fn packed(self) -> u8 {
        self.0
    }
}
