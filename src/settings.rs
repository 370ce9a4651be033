use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};

use crate::display::DisplayFormat;

pub const DEFAULT_NTP_ADDRESS: &str = "pool.ntp.org";
pub const DEFAULT_NTP_PORT: u32 = 123;
pub const DEFAULT_SYNC_INTERVAL_MS: u64 = 3_600_000;
pub const DEFAULT_COLOR_FILE: &str = "clock.col";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TimeSourceKind {
    #[default]
    Local,
    Network,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeConfig {
    pub source: TimeSourceKind,
    pub address: String,
    pub port: u32,
    pub sync_interval_ms: u64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            source: TimeSourceKind::Local,
            address: DEFAULT_NTP_ADDRESS.into(),
            port: DEFAULT_NTP_PORT,
            sync_interval_ms: DEFAULT_SYNC_INTERVAL_MS,
        }
    }
}

impl TimeConfig {
    pub fn network(address: impl Into<String>, port: u32, sync_interval_ms: u64) -> Self {
        Self {
            source: TimeSourceKind::Network,
            address: address.into(),
            port,
            sync_interval_ms,
        }
    }

    pub fn is_network(&self) -> bool {
        self.source == TimeSourceKind::Network
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RenderFlags {
    pub dvd_logo: bool,
    pub gradient: bool,
    pub custom_color: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ClockSettings {
    /// Raw format value as persisted; see [`DisplayFormat::from_raw`].
    pub display_format: i32,
    pub flags: RenderFlags,
    pub color_file: Option<PathBuf>,
    pub time: TimeConfig,
    /// Catalog index; `None` follows the host's current offset.
    pub time_zone: Option<usize>,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            display_format: DisplayFormat::default().as_raw(),
            flags: RenderFlags::default(),
            color_file: None,
            time: TimeConfig::default(),
            time_zone: None,
        }
    }
}

/// JSON-backed settings, read once at startup and written through on change.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<ClockSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!(
                    "Ignoring unreadable settings in {} ({err}); using defaults",
                    path.display()
                );
                ClockSettings::default()
            })
        } else {
            ClockSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> ClockSettings {
        self.read().clone()
    }

    pub fn time_config(&self) -> TimeConfig {
        self.read().time.clone()
    }

    /// Where the custom color file lives: the configured path, or
    /// `clock.col` next to the settings file.
    pub fn color_file(&self) -> PathBuf {
        match &self.read().color_file {
            Some(path) => path.clone(),
            None => self
                .path
                .parent()
                .map(|dir| dir.join(DEFAULT_COLOR_FILE))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_COLOR_FILE)),
        }
    }

    pub fn update_display_format(&self, raw: i32) -> Result<()> {
        self.update(|data| data.display_format = raw)
    }

    pub fn update_flags(&self, flags: RenderFlags) -> Result<()> {
        self.update(|data| data.flags = flags)
    }

    pub fn update_time(&self, time: TimeConfig, time_zone: Option<usize>) -> Result<()> {
        self.update(|data| {
            data.time = time;
            data.time_zone = time_zone;
        })
    }

    fn update(&self, apply: impl FnOnce(&mut ClockSettings)) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut guard);
        self.persist(&guard)
    }

    fn persist(&self, data: &ClockSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, ClockSettings> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("xpclock.json")).unwrap();
        let settings = store.snapshot();

        assert_eq!(settings, ClockSettings::default());
        assert_eq!(settings.time.address, "pool.ntp.org");
        assert_eq!(settings.time.port, 123);
        assert_eq!(settings.time.sync_interval_ms, 3_600_000);
        assert_eq!(settings.time.source, TimeSourceKind::Local);
    }

    #[test]
    fn corrupt_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("xpclock.json");
        fs::write(&path, "{ not json").unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.snapshot(), ClockSettings::default());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("xpclock.json");
        fs::write(&path, r#"{ "displayFormat": 3 }"#).unwrap();

        let store = SettingsStore::new(path).unwrap();
        let settings = store.snapshot();
        assert_eq!(settings.display_format, 3);
        assert_eq!(settings.time, TimeConfig::default());
    }

    #[test]
    fn updates_are_written_through() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("xpclock.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        store.update_display_format(2).unwrap();
        store
            .update_flags(RenderFlags {
                dvd_logo: true,
                gradient: true,
                custom_color: false,
            })
            .unwrap();
        store
            .update_time(TimeConfig::network("time.example.org", 1123, 60_000), Some(23))
            .unwrap();

        let reopened = SettingsStore::new(path).unwrap().snapshot();
        assert_eq!(reopened.display_format, 2);
        assert!(reopened.flags.dvd_logo);
        assert!(reopened.flags.gradient);
        assert_eq!(reopened.time.address, "time.example.org");
        assert_eq!(reopened.time.port, 1123);
        assert!(reopened.time.is_network());
        assert_eq!(reopened.time_zone, Some(23));
    }

    #[test]
    fn color_file_defaults_next_to_settings() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("xpclock.json")).unwrap();
        assert_eq!(store.color_file(), dir.path().join("clock.col"));
    }

    #[test]
    fn configured_color_file_wins() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("xpclock.json");
        fs::write(&path, r#"{ "colorFile": "/tmp/other.col" }"#).unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.color_file(), PathBuf::from("/tmp/other.col"));
    }
}
