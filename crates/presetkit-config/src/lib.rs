//! Artifact files and configuration for presetkit.
//!
//! # Features
//!
//! - **Artifacts**: read and write `<Plugin>.type.json` schemas,
//!   `<Plugin>.preset.json` decoded presets and the `GUID.json` map
//! - **Tolerance**: the external default-tolerance allow-list (TOML)
//! - **Paths**: artifact names and the user configuration directory
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use presetkit_config::{ToleranceList, load_schema_for};
//!
//! let mut schema = load_schema_for("LightPadSynth", Path::new("json")).unwrap();
//! let tolerance = ToleranceList::discover(None).unwrap();
//! tolerance.apply(&mut schema);
//! ```

mod artifact;
mod error;
mod tolerance;

/// Artifact names and configuration file locations.
pub mod paths;

pub use artifact::{
    GuidEntry, GuidMap, PresetRecord, load_guid_map, load_presets, load_schema, load_schema_for,
    save_guid_map, save_presets, save_schema,
};
pub use error::ConfigError;
pub use paths::{DEFAULT_OUT_DIR, find_tolerance_file, user_config_dir};
pub use tolerance::{PluginTolerance, ToleranceList};
