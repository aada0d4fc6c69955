//! Persisted preferences for the `ctb-reader` command.
//!
//! Stored as JSON at an OS-appropriate location. Command-line flags take
//! precedence over anything read here.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CliSettings {
    /// Directory that embedded images and files are written to by `content`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract_directory: Option<String>,
    /// Indent JSON output.
    pub pretty_json: bool,
}

impl Default for CliSettings {
    fn default() -> Self {
        Self {
            extract_directory: None,
            pretty_json: true,
        }
    }
}

impl CliSettings {
    pub fn extract_dir(&self) -> Option<PathBuf> {
        self.extract_directory
            .as_deref()
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
    }
}

/// Returns the path to the settings JSON file.
///
/// - macOS / Linux: `~/.config/ctb-reader/settings.json`
/// - Windows: `%APPDATA%/ctb-reader/settings.json`
pub fn settings_file_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("ctb-reader").join("settings.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config").join("ctb-reader").join("settings.json")
    }
}

/// Loads settings from the default location.
pub fn load_settings() -> CliSettings {
    load_settings_from(&settings_file_path())
}

/// Loads settings from `path`; returns defaults if the file is missing or corrupt.
pub fn load_settings_from(path: &Path) -> CliSettings {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("ignoring unreadable settings {}: {e}", path.display());
            CliSettings::default()
        }),
        Err(_) => CliSettings::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let settings = load_settings_from(&tmp.path().join("settings.json"));
        assert_eq!(settings, CliSettings::default());
        assert!(settings.pretty_json);
        assert!(settings.extract_dir().is_none());
    }

    #[test]
    fn test_reads_camel_case_fields() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        fs::write(&path, r#"{"extractDirectory": "/tmp/out", "prettyJson": false}"#).unwrap();
        let settings = load_settings_from(&path);
        assert!(!settings.pretty_json);
        assert_eq!(settings.extract_dir(), Some(PathBuf::from("/tmp/out")));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        fs::write(&path, r#"{"extractDirectory": ""}"#).unwrap();
        let settings = load_settings_from(&path);
        assert!(settings.pretty_json);
        assert!(settings.extract_dir().is_none());
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(load_settings_from(&path), CliSettings::default());
    }
}
