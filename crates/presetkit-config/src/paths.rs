//! Artifact names and configuration file locations.
//!
//! # Directory Structure
//!
//! - **Artifacts**: `<out>/<Plugin>.type.json`, `<out>/<Plugin>.preset.json`,
//!   `<out>/GUID.json` (`<out>` defaults to `./json`)
//! - **User config**: `~/.config/presetkit/` (Linux),
//!   `~/Library/Application Support/presetkit/` (macOS), `%APPDATA%\presetkit\`
//!   (Windows)

use std::path::{Path, PathBuf};

/// Application name used for directory paths.
const APP_NAME: &str = "presetkit";

/// File name of the default-tolerance allow-list.
pub const TOLERANCE_FILE: &str = "tolerance.toml";

/// File name of the processor GUID map.
pub const GUID_FILE: &str = "GUID.json";

/// Default artifact directory, relative to the working directory.
pub const DEFAULT_OUT_DIR: &str = "json";

const SCHEMA_SUFFIX: &str = ".type.json";
const PRESET_SUFFIX: &str = ".preset.json";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// `<Plugin>.type.json`
pub fn schema_file_name(plugin: &str) -> String {
    format!("{plugin}{SCHEMA_SUFFIX}")
}

/// `<Plugin>.preset.json`
pub fn preset_file_name(plugin: &str) -> String {
    format!("{plugin}{PRESET_SUFFIX}")
}

/// Plugin name from a schema artifact path (`json/MiniVerb.type.json` →
/// `MiniVerb`).
pub fn plugin_from_schema_path(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    file_name
        .strip_suffix(SCHEMA_SUFFIX)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Locate the tolerance allow-list.
///
/// Searches in the following order:
/// 1. `explicit`, if given (returned even if it does not exist, so the caller
///    reports the missing file)
/// 2. `tolerance.toml` in the working directory
/// 3. `tolerance.toml` in the user config directory
pub fn find_tolerance_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let local = PathBuf::from(TOLERANCE_FILE);
    if local.is_file() {
        return Some(local);
    }

    let user = user_config_dir().join(TOLERANCE_FILE);
    if user.is_file() {
        return Some(user);
    }

    None
}

/// Ensure `dir` exists, creating it and its parents if needed.
pub fn ensure_dir(dir: &Path) -> Result<(), crate::ConfigError> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| crate::ConfigError::create_dir(dir, e))?;
    }
    Ok(())
}

/// Files under `root` whose extension is `ext`, searched recursively and
/// sorted by path.
///
/// Unreadable directories are skipped with a warning.
pub fn find_files(root: &Path, ext: &str) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
                continue;
            }
        };
        for path in entries.filter_map(|entry| entry.ok()).map(|entry| entry.path()) {
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|e| e == ext) {
                found.push(path);
            }
        }
    }

    found.sort();
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn user_config_dir_ends_with_app_name() {
        assert!(user_config_dir().ends_with(APP_NAME));
    }

    #[test]
    fn artifact_names() {
        assert_eq!(schema_file_name("MiniVerb"), "MiniVerb.type.json");
        assert_eq!(preset_file_name("MiniVerb"), "MiniVerb.preset.json");
    }

    #[test]
    fn plugin_name_from_schema_path() {
        assert_eq!(
            plugin_from_schema_path(Path::new("json/MiniVerb.type.json")),
            Some("MiniVerb".to_string())
        );
        assert_eq!(plugin_from_schema_path(Path::new("json/.type.json")), None);
        assert_eq!(plugin_from_schema_path(Path::new("json/MiniVerb.json")), None);
    }

    #[test]
    fn explicit_tolerance_path_wins() {
        let path = Path::new("/nonexistent/custom.toml");
        assert_eq!(find_tolerance_file(Some(path)), Some(path.to_path_buf()));
    }

    #[test]
    fn ensure_dir_creates_nested() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("a").join("b");
        ensure_dir(&dir).unwrap();
        assert!(dir.is_dir());
        // Existing directory is fine.
        ensure_dir(&dir).unwrap();
    }

    #[test]
    fn find_files_is_recursive_and_sorted() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("Bank B");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp.path().join("b.vstpreset"), b"").unwrap();
        fs::write(temp.path().join("a.vstpreset"), b"").unwrap();
        fs::write(nested.join("c.vstpreset"), b"").unwrap();
        fs::write(temp.path().join("notes.txt"), b"").unwrap();

        let found = find_files(temp.path(), "vstpreset");
        let names: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(temp.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["Bank B/c.vstpreset", "a.vstpreset", "b.vstpreset"]);
    }

    #[test]
    fn find_files_missing_root_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(find_files(&temp.path().join("missing"), "vstpreset").is_empty());
    }
}
