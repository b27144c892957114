use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

pub const SETTINGS_PATH_ENV: &str = "AUTOMATIC_BACKUP_SETTINGS";

/// Accepted range for both interval (minutes) and count.
pub const MIN_VALUE: u32 = 1;
pub const MAX_VALUE: u32 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub enabled: bool,
    /// Minutes between backup ticks.
    pub interval: u32,
    /// Maximum number of backups kept.
    pub count: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: 5,
            count: 12,
        }
    }
}

/// On-disk layout: one string value per key, like browser key-value storage.
/// Keys owned by other tools are carried through untouched.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredEntries {
    #[serde(rename = "oscd-automatic-backup-enabled", default, skip_serializing_if = "Option::is_none")]
    enabled: Option<String>,
    #[serde(rename = "oscd-automatic-backup-interval", default, skip_serializing_if = "Option::is_none")]
    interval: Option<String>,
    #[serde(rename = "oscd-automatic-backup-count", default, skip_serializing_if = "Option::is_none")]
    count: Option<String>,
    #[serde(flatten)]
    other: BTreeMap<String, serde_json::Value>,
}

fn parse_bounded(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| (MIN_VALUE..=MAX_VALUE).contains(v))
        .unwrap_or(default)
}

impl Settings {
    fn from_entries(entries: &StoredEntries) -> Self {
        let defaults = Settings::default();
        Self {
            enabled: entries.enabled.as_deref() == Some("true"),
            interval: parse_bounded(entries.interval.as_deref(), defaults.interval),
            count: parse_bounded(entries.count.as_deref(), defaults.count),
        }
    }

    fn write_entries(&self, entries: &mut StoredEntries) {
        entries.enabled = Some(self.enabled.to_string());
        entries.interval = Some(self.interval.to_string());
        entries.count = Some(self.count.to_string());
    }
}

/// String key-value file holding the persisted settings.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// `$AUTOMATIC_BACKUP_SETTINGS`, else `<config dir>/automatic-backup/settings.json`.
    pub fn from_env() -> Self {
        let path = env::var_os(SETTINGS_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("automatic-backup")
                    .join("settings.json")
            });
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Option<StoredEntries> {
        let raw = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(entries) => Some(entries),
            Err(e) => {
                log::warn!("ignoring corrupt settings {}: {e}", self.path.display());
                None
            }
        }
    }

    /// Last saved settings; defaults for anything missing or unreadable.
    pub fn load(&self) -> Settings {
        let settings = self
            .read_entries()
            .map(|entries| Settings::from_entries(&entries))
            .unwrap_or_default();
        log::debug!("loaded settings {settings:?} from {}", self.path.display());
        settings
    }

    /// Writes all three keys in one replace, keeping unrelated keys.
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).map_err(io_err)?;
            }
        }

        let mut entries = self.read_entries().unwrap_or_default();
        settings.write_entries(&mut entries);
        let raw = serde_json::to_string_pretty(&entries)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}
