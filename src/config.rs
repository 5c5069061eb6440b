//! Persisted user settings (lives in the OS config directory).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::TimelineScale;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Granularity the chart opens with.
    pub default_scale: TimelineScale,
    /// Project reopened on startup, if it still exists.
    pub last_project: Option<PathBuf>,
    pub side_panel_width: f32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_scale: TimelineScale::Week,
            last_project: None,
            side_panel_width: 320.0,
        }
    }
}

impl AppSettings {
    /// Location of `settings.json`, falling back to the working directory
    /// when no config directory can be determined.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "SitePlanner")
            .map(|dirs| dirs.config_dir().join("settings.json"))
            .unwrap_or_else(|| PathBuf::from("settings.json"))
    }

    /// Load settings; a missing or unreadable file yields the defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                log::warn!("ignoring malformed settings {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), crate::error::FileError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(AppSettings::load(&path), AppSettings::default());

        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(AppSettings::load(&path), AppSettings::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = AppSettings {
            default_scale: TimelineScale::Month,
            last_project: Some(PathBuf::from("/tmp/site.json")),
            side_panel_width: 280.0,
        };
        settings.save(&path).unwrap();
        assert_eq!(AppSettings::load(&path), settings);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "default_scale": "Day" }"#).unwrap();
        let loaded = AppSettings::load(&path);
        assert_eq!(loaded.default_scale, TimelineScale::Day);
        assert_eq!(loaded.side_panel_width, 320.0);
    }
}
