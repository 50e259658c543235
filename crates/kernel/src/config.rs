use std::collections::HashMap;

use railyard_api::{Family, WorkspaceLayout};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Per-handler enablement supplied by the embedding application's property
/// mapper. Handlers are enabled unless the map says otherwise; whole families
/// can be switched off by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineSettings {
    #[serde(default)]
    pub enabled: HashMap<String, bool>,
    #[serde(default)]
    pub disabled_families: Vec<String>,
}

impl PipelineSettings {
    pub fn enabled_for(&self, handler_id: &str) -> bool {
        self.enabled.get(handler_id).copied().unwrap_or(true)
    }

    pub fn disable(&mut self, handler_id: impl Into<String>) {
        self.enabled.insert(handler_id.into(), false);
    }

    /// Routing-key bits of every family named in `disabled_families`.
    /// An unknown name is a configuration error.
    pub fn disabled_family_bits(&self) -> Result<Family> {
        let mut bits = Family::empty();
        for name in &self.disabled_families {
            bits |= Family::from_name(name)?;
        }
        Ok(bits)
    }
}

/// Top-level pipeline configuration: the workspace layout scope priorities
/// are computed against, plus the settings map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub layout: WorkspaceLayout,
    #[serde(default)]
    pub settings: PipelineSettings,
}

impl PipelineConfig {
    pub fn new(layout: WorkspaceLayout) -> Self {
        Self {
            layout,
            settings: PipelineSettings::default(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
