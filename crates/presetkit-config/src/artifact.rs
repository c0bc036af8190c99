//! JSON artifacts: schemas, decoded presets and the processor GUID map.
//!
//! # Formats
//!
//! `<Plugin>.type.json`, one object per wire parameter in id order:
//!
//! ```json
//! [
//!   { "id": 0, "name": "bypass", "type": "UInt32", "default": 0,
//!     "scale": "Scales::boolScale", "flags": "Info::kCanAutomate" }
//! ]
//! ```
//!
//! `<Plugin>.preset.json`, one object per preset file:
//!
//! ```json
//! [ { "name": "Init", "parameter": [ { "name": "bypass", "type": "UInt32", "value": 0 } ] } ]
//! ```
//!
//! `GUID.json`, keyed by plugin:
//!
//! ```json
//! { "MiniVerb": { "processor_guid": "8A1F03C25B7E4D909C26E1F40D3B7A65" } }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use presetkit_core::{DecodedParameter, ParameterDescriptor, ParameterSchema};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::paths;

/// Decoded parameters of one preset file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetRecord {
    /// Preset file stem.
    pub name: String,
    /// Parameters in schema order.
    pub parameter: Vec<DecodedParameter>,
}

impl PresetRecord {
    /// Record for the preset at `path`, named after its file stem.
    pub fn from_path(path: &Path, parameter: Vec<DecodedParameter>) -> Self {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { name, parameter }
    }
}

/// Entry of `GUID.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidEntry {
    /// 32 hex characters of the processor class id.
    pub processor_guid: String,
}

/// Plugin name → processor GUID, ordered by plugin.
pub type GuidMap = BTreeMap<String, GuidEntry>;

/// Write `<out_dir>/<Plugin>.type.json`, returning its path.
pub fn save_schema(schema: &ParameterSchema, out_dir: &Path) -> Result<PathBuf, ConfigError> {
    let path = out_dir.join(paths::schema_file_name(schema.plugin()));
    write_json(&path, schema.descriptors())?;
    tracing::debug!(path = %path.display(), parameters = schema.len(), "wrote schema");
    Ok(path)
}

/// Read a schema artifact. The plugin name comes from the file name.
pub fn load_schema(path: &Path) -> Result<ParameterSchema, ConfigError> {
    let plugin = paths::plugin_from_schema_path(path).unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let descriptors: Vec<ParameterDescriptor> = read_json(path)?;
    Ok(ParameterSchema::new(plugin, descriptors)?)
}

/// Read `<dir>/<plugin>.type.json`.
pub fn load_schema_for(plugin: &str, dir: &Path) -> Result<ParameterSchema, ConfigError> {
    let path = dir.join(paths::schema_file_name(plugin));
    if !path.is_file() {
        return Err(ConfigError::SchemaNotFound {
            plugin: plugin.to_string(),
            path,
        });
    }
    load_schema(&path)
}

/// Write `<out_dir>/<plugin>.preset.json`, returning its path.
pub fn save_presets(
    plugin: &str,
    records: &[PresetRecord],
    out_dir: &Path,
) -> Result<PathBuf, ConfigError> {
    let path = out_dir.join(paths::preset_file_name(plugin));
    write_json(&path, records)?;
    tracing::debug!(path = %path.display(), presets = records.len(), "wrote presets");
    Ok(path)
}

/// Read a decoded preset artifact.
pub fn load_presets(path: &Path) -> Result<Vec<PresetRecord>, ConfigError> {
    read_json(path)
}

/// Read `<dir>/GUID.json`; a missing file is an empty map.
pub fn load_guid_map(dir: &Path) -> Result<GuidMap, ConfigError> {
    let path = dir.join(paths::GUID_FILE);
    if !path.exists() {
        return Ok(GuidMap::new());
    }
    read_json(&path)
}

/// Write `<dir>/GUID.json`, returning its path.
pub fn save_guid_map(map: &GuidMap, dir: &Path) -> Result<PathBuf, ConfigError> {
    let path = dir.join(paths::GUID_FILE);
    write_json(&path, map)?;
    Ok(path)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        paths::ensure_dir(parent)?;
    }
    let mut content = serde_json::to_string_pretty(value).map_err(|e| ConfigError::json(path, e))?;
    content.push('\n');
    std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    serde_json::from_str(&content).map_err(|e| ConfigError::json(path, e))
}
