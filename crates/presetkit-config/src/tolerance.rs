//! Default-tolerance allow-list.
//!
//! Some legacy presets were saved before a plugin gained parameters, so their
//! component state stops short. Listing those parameters here lets them fall
//! back to their declared default instead of failing the decode. Nothing is
//! ever marked tolerant unless it appears in this file.
//!
//! # TOML Format
//!
//! ```toml
//! [[plugin]]
//! name = "LightPadSynth"
//! parameters = [1506, 1513]
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use presetkit_core::ParameterSchema;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::paths;

/// Tolerant parameter ids for one plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginTolerance {
    /// Plugin name, as in the schema.
    pub name: String,
    /// Descriptor ids that may fall back to their default.
    #[serde(default)]
    pub parameters: Vec<u32>,
}

/// The whole allow-list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToleranceList {
    /// Per-plugin entries.
    #[serde(default)]
    pub plugin: Vec<PluginTolerance>,
}

impl ToleranceList {
    /// Parse an allow-list from TOML text.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load an allow-list file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load the allow-list found by [`paths::find_tolerance_file`]. No file
    /// anywhere is an empty list; an explicit path that does not exist is an
    /// error.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match paths::find_tolerance_file(explicit) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading tolerance allow-list");
                Self::load(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Tolerant ids for `plugin`, merged across entries.
    pub fn ids_for(&self, plugin: &str) -> BTreeSet<u32> {
        self.plugin
            .iter()
            .filter(|entry| entry.name == plugin)
            .flat_map(|entry| entry.parameters.iter().copied())
            .collect()
    }

    /// True if the list names no parameters at all.
    pub fn is_empty(&self) -> bool {
        self.plugin.iter().all(|entry| entry.parameters.is_empty())
    }

    /// Mark the listed descriptors of `schema` as default-tolerant.
    ///
    /// Returns the listed ids the schema does not have; each is also logged,
    /// since it usually means the allow-list is stale.
    pub fn apply(&self, schema: &mut ParameterSchema) -> Vec<u32> {
        let ids = self.ids_for(schema.plugin());
        if ids.is_empty() {
            return Vec::new();
        }
        let missing = schema.mark_default_tolerant(ids.iter().copied());
        for id in &missing {
            tracing::warn!(plugin = schema.plugin(), id, "allow-listed parameter id not in schema");
        }
        tracing::debug!(
            plugin = schema.plugin(),
            tolerant = ids.len() - missing.len(),
            "applied tolerance allow-list"
        );
        missing
    }
}
