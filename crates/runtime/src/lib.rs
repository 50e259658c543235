use std::sync::Arc;

use railyard_api::Stage;
use railyard_kernel::{LoadOptions, Pipeline, PipelineConfig};
use railyard_plugin::{Extension, Handler};

/// One unit the bootstrap loader feeds into the kernel. Discovery of
/// concrete handler/extension types stays with the embedding application;
/// this crate only performs the explicit `load` calls.
pub enum Registration {
    Handler(Arc<dyn Handler>, LoadOptions),
    Extension(Arc<dyn Extension>),
}

impl Registration {
    pub fn handler(handler: Arc<dyn Handler>) -> Self {
        Self::Handler(handler, LoadOptions::default())
    }

    pub fn handler_at(handler: Arc<dyn Handler>, stage: Stage) -> Self {
        Self::Handler(handler, LoadOptions::at(stage))
    }

    pub fn extension(extension: Arc<dyn Extension>) -> Self {
        Self::Extension(extension)
    }

    fn family(&self) -> railyard_api::Family {
        match self {
            Self::Handler(handler, _) => handler.family(),
            Self::Extension(extension) => extension.family(),
        }
    }
}

/// Bootstraps a pipeline and loads every supplied registration.
///
/// This function acts as the central factory for the railyard runtime:
/// plugin crates construct their handlers against `config` (scope priorities
/// from the layout, enablement from the settings) and hand them over here.
/// A handler that fails to load is logged and skipped; the remaining
/// registrations still go through.
pub fn bootstrap(config: &PipelineConfig, registrations: Vec<Registration>) -> Arc<Pipeline> {
    let pipeline = Arc::new(Pipeline::new());

    tracing::info!(
        sdk_root = %config.layout.sdk_root.display(),
        project_root = %config.layout.project_root.display(),
        count = registrations.len(),
        "bootstrapping pipeline"
    );

    let disabled = match config.settings.disabled_family_bits() {
        Ok(bits) => bits,
        Err(e) => {
            tracing::error!("Invalid disabled_families setting: {}", e);
            railyard_api::Family::empty()
        }
    };

    for registration in registrations {
        if registration.family().intersects(disabled) {
            tracing::info!(family = %registration.family(), "family disabled by settings; skipping");
            continue;
        }
        match registration {
            Registration::Handler(handler, options) => {
                if let Err(e) = pipeline.load(handler, options) {
                    tracing::error!("Failed to load handler: {}", e);
                }
            }
            Registration::Extension(extension) => pipeline.load_extension(extension),
        }
    }

    pipeline
}

/// Initializes the logging system for a specific component.
/// This delegates to the kernel logging module.
pub fn init_logging(component: &str) -> Option<impl Drop> {
    Some(railyard_kernel::logging::init_logging(component, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use railyard_api::{Family, ScopePath, ScopePriority, WorkspaceLayout};
    use railyard_plugin::{Command, PluginResult};

    struct NullLinter {
        scope: ScopePath,
        priority: ScopePriority,
        enabled: bool,
    }

    impl Handler for NullLinter {
        fn family(&self) -> Family {
            Family::LINT
        }

        fn scope(&self) -> &ScopePath {
            &self.scope
        }

        fn enabled(&self) -> bool {
            self.enabled
        }

        fn priority(&self) -> ScopePriority {
            self.priority
        }

        fn process(&self, _command: &Command) -> PluginResult<bool> {
            Ok(true)
        }
    }

    #[test]
    fn bootstrap_loads_handlers_with_settings_applied() {
        let mut config = PipelineConfig::new(WorkspaceLayout::new("/sdk", "/project"));
        config.settings.disable("lint.disabled");

        let scope = ScopePath::new("/sdk");
        let linter = Arc::new(NullLinter {
            priority: ScopePriority::for_scope(&scope, &config.layout),
            scope,
            enabled: config.settings.enabled_for("lint.default"),
        });

        let pipeline = bootstrap(&config, vec![Registration::handler(linter)]);
        let cmd = Command::new(Family::LINT, "/project/src/main.cpp");
        assert!(pipeline.dispatch(&cmd).accepted);
    }

    #[test]
    fn bootstrap_skips_registrations_of_disabled_families() {
        let mut config = PipelineConfig::new(WorkspaceLayout::new("/sdk", "/project"));
        config.settings.disabled_families.push("lint".to_string());

        let scope = ScopePath::new("/sdk");
        let linter = Arc::new(NullLinter {
            priority: ScopePriority::for_scope(&scope, &config.layout),
            scope,
            enabled: true,
        });

        let pipeline = bootstrap(&config, vec![Registration::handler(linter)]);
        let cmd = Command::new(Family::LINT, "/project/src/main.cpp");
        assert!(!pipeline.dispatch(&cmd).accepted);
    }
}
