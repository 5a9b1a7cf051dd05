use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tauri::AppHandle;
use tauri::Manager;

use crate::render::IconStyle;

const SETTINGS_FILE_NAME: &str = "settings.json";

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const MIN_POLL_INTERVAL_SECS: u64 = 30;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_BASE_URL: &str = "https://claude.ai";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Seconds between usage polls. Values below 30 are raised to 30.
    pub poll_interval_secs: u64,

    /// Host serving the bootstrap and usage documents; the tray click opens its usage page.
    pub base_url: String,

    /// Bar or arc gauge.
    pub icon_style: IconStyle,

    /// Per-request timeout for both endpoints.
    pub http_timeout_secs: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            base_url: DEFAULT_BASE_URL.to_string(),
            icon_style: IconStyle::Bar,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl AppSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(MIN_POLL_INTERVAL_SECS))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    /// Base URL without a trailing slash, falling back to the default when blank.
    pub fn base_url(&self) -> &str {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            DEFAULT_BASE_URL
        } else {
            trimmed
        }
    }

    pub fn usage_page_url(&self) -> String {
        format!("{}/settings/usage", self.base_url())
    }
}

fn settings_path(app: &AppHandle) -> Result<PathBuf, String> {
    let dir = app
        .path()
        .app_config_dir()
        .map_err(|e| format!("Could not determine config directory: {}", e))?;
    Ok(dir.join(SETTINGS_FILE_NAME))
}

/// Load settings from the app config dir. A missing file is created with
/// defaults so there is something to edit; an unreadable one is left alone.
pub fn load_settings(app: &AppHandle) -> AppSettings {
    match settings_path(app) {
        Ok(path) => load_or_init_settings_at(&path),
        Err(e) => {
            log::warn!("Settings: {}", e);
            AppSettings::default()
        }
    }
}

enum SettingsFile {
    Loaded(AppSettings),
    Missing,
    Unusable,
}

fn read_settings_file(path: &Path) -> SettingsFile {
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<AppSettings>(&contents) {
            Ok(settings) => SettingsFile::Loaded(settings),
            Err(e) => {
                log::warn!("Settings: failed to parse {:?}, using defaults: {}", path, e);
                SettingsFile::Unusable
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => SettingsFile::Missing,
        Err(e) => {
            log::warn!("Settings: failed to read {:?}, using defaults: {}", path, e);
            SettingsFile::Unusable
        }
    }
}

pub fn load_settings_from(path: &Path) -> AppSettings {
    match read_settings_file(path) {
        SettingsFile::Loaded(settings) => settings,
        SettingsFile::Missing | SettingsFile::Unusable => AppSettings::default(),
    }
}

/// Like `load_settings_from`, but writes defaults when the file does not exist.
pub fn load_or_init_settings_at(path: &Path) -> AppSettings {
    match read_settings_file(path) {
        SettingsFile::Loaded(settings) => settings,
        SettingsFile::Unusable => AppSettings::default(),
        SettingsFile::Missing => {
            let settings = AppSettings::default();
            match save_settings_to(path, &settings) {
                Ok(()) => log::info!("Settings: wrote defaults to {:?}", path),
                Err(e) => log::warn!("Settings: {}", e),
            }
            settings
        }
    }
}

pub fn save_settings_to(path: &Path, settings: &AppSettings) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory {:?}: {}", parent, e))?;
    }

    let contents =
        serde_json::to_string_pretty(settings).map_err(|e| format!("Serialize settings: {}", e))?;

    // Write to a temp file in the same directory, then rename over the original.
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &contents)
        .map_err(|e| format!("Write temp settings {:?}: {}", tmp_path, e))?;

    // On Windows, rename fails if the destination exists.
    if cfg!(windows) && path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(format!("Remove existing settings file {:?}: {}", path, e));
            }
        }
    }

    std::fs::rename(&tmp_path, path).map_err(|e| {
        format!(
            "Rename temp settings {:?} to {:?}: {}",
            tmp_path, path, e
        )
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = load_settings_from(&dir.path().join(SETTINGS_FILE_NAME));
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.poll_interval(), Duration::from_secs(60));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, r#"{ "icon_style": "arc", "poll_interval_secs": 5 }"#).unwrap();

        let settings = load_settings_from(&path);
        assert_eq!(settings.icon_style, IconStyle::Arc);
        assert_eq!(settings.poll_interval(), Duration::from_secs(30));
        assert_eq!(settings.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, "poll_interval_secs = 10").unwrap();
        assert_eq!(load_settings_from(&path), AppSettings::default());
    }

    #[test]
    fn init_writes_defaults_when_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cfg").join(SETTINGS_FILE_NAME);

        let settings = load_or_init_settings_at(&path);
        assert_eq!(settings, AppSettings::default());
        assert!(path.exists());
        assert_eq!(load_settings_from(&path), AppSettings::default());
    }

    #[test]
    fn init_leaves_malformed_file_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        let contents = r#"{ "poll_interval_secs": 300, "base_url": "https://x.test", }"#;
        std::fs::write(&path, contents).unwrap();

        let settings = load_or_init_settings_at(&path);
        assert_eq!(settings, AppSettings::default());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), contents);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn init_keeps_valid_file_as_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        let contents = r#"{ "poll_interval_secs": 300 }"#;
        std::fs::write(&path, contents).unwrap();

        let settings = load_or_init_settings_at(&path);
        assert_eq!(settings.poll_interval(), Duration::from_secs(300));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), contents);
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cfg").join(SETTINGS_FILE_NAME);
        let settings = AppSettings {
            poll_interval_secs: 120,
            base_url: "https://usage.example/".to_string(),
            icon_style: IconStyle::Arc,
            http_timeout_secs: 5,
        };

        save_settings_to(&path, &settings).unwrap();
        let loaded = load_settings_from(&path);
        assert_eq!(loaded, settings);
        assert_eq!(loaded.base_url(), "https://usage.example");
        assert_eq!(loaded.usage_page_url(), "https://usage.example/settings/usage");
    }
}
