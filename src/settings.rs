//! Shared settings for the floorplan-scale GUI.
//! Persisted in the platform-specific config directory via `directories::ProjectDirs`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::detection::{DetectionConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::scale::LengthUnit;

/// Application settings that can be saved and loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Detection service base URL
    pub base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Last wall length typed by the user
    pub wall_length_input: String,
    /// Unit of the wall length
    pub unit: LengthUnit,
    /// Initial window width
    pub window_width: f32,
    /// Initial window height
    pub window_height: f32,
    /// TTF/OTF font used for labels in exported annotations
    pub label_font_path: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            wall_length_input: String::new(),
            unit: LengthUnit::Meter,
            window_width: 1280.0,
            window_height: 860.0,
            label_font_path: String::new(),
        }
    }
}

impl AppSettings {
    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "floorplan-scale", "floorplan-scale")
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path.
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.json"))
    }

    /// Load settings from the config file.
    pub fn load() -> Self {
        Self::settings_path()
            .and_then(|path| fs::read_to_string(&path).ok())
            .map(|content| Self::from_json(&content))
            .unwrap_or_default()
    }

    /// Parse settings, falling back to defaults for missing or unusable values.
    pub fn from_json(content: &str) -> Self {
        let defaults = Self::default();
        let mut loaded: Self = serde_json::from_str(content).unwrap_or_default();

        // Backfill values older or hand-edited files leave unusable
        if loaded.base_url.trim().is_empty() {
            loaded.base_url = defaults.base_url;
        }
        if loaded.request_timeout_secs == 0 {
            loaded.request_timeout_secs = defaults.request_timeout_secs;
        }
        if loaded.window_width < 320.0 || loaded.window_height < 240.0 {
            loaded.window_width = defaults.window_width;
            loaded.window_height = defaults.window_height;
        }

        loaded
    }

    /// Save settings to the config file.
    pub fn save(&self) -> Result<(), String> {
        let dir = Self::config_dir().ok_or("Cannot determine config directory")?;

        fs::create_dir_all(&dir)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;

        let path = dir.join("settings.json");
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        fs::write(&path, content)
            .map_err(|e| format!("Failed to write settings file: {}", e))?;

        Ok(())
    }

    /// Get logs directory path.
    pub fn logs_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.data_dir().join("logs"))
    }

    /// Detection client configuration derived from these settings.
    pub fn detection_config(&self) -> DetectionConfig {
        DetectionConfig::default()
            .with_base_url(self.base_url.trim())
            .with_timeout(self.request_timeout_secs)
    }

    /// Label font path, if one is configured.
    pub fn label_font(&self) -> Option<PathBuf> {
        let path = self.label_font_path.trim();
        (!path.is_empty()).then(|| PathBuf::from(path))
    }
}
