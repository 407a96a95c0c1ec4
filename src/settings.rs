use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::db::DB_FILE;
use crate::error::{PaydownError, Result};

pub const DEFAULT_USER: &str = "default";
pub const DEFAULT_CURRENCY: &str = "AUD";

/// User preferences, passed explicitly to whatever needs them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_data_dir_string")]
    pub data_dir: String,
    /// Ledger owner for every command run from this machine.
    #[serde(default = "default_user")]
    pub user_id: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_user() -> String {
    DEFAULT_USER.to_string()
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_data_dir_string() -> String {
    default_data_dir().to_string_lossy().to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir_string(),
            user_id: default_user(),
            currency: default_currency(),
        }
    }
}

impl Settings {
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_path().join(DB_FILE)
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("paydown")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("paydown")
}

/// Settings at `path`, or defaults when the file is missing or unreadable.
pub fn load_settings_from(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
        Err(_) => Settings::default(),
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings).map_err(|e| PaydownError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(settings, &settings_path())
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            data_dir: "/tmp/paydown-test".to_string(),
            user_id: "alice".to_string(),
            currency: "USD".to_string(),
        };
        save_settings_to(&settings, &path).unwrap();
        let loaded = load_settings_from(&path);
        assert_eq!(loaded.data_dir, "/tmp/paydown-test");
        assert_eq!(loaded.user_id, "alice");
        assert_eq!(loaded.currency, "USD");
        assert_eq!(loaded.db_path(), PathBuf::from("/tmp/paydown-test").join(DB_FILE));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let s = load_settings_from(&dir.path().join("absent.json"));
        assert_eq!(s.user_id, DEFAULT_USER);
        assert_eq!(s.currency, DEFAULT_CURRENCY);
        assert!(!s.data_dir.is_empty());
    }

    #[test]
    fn test_partial_file_merges_with_defaults() {
        let s: Settings = serde_json::from_str(r#"{"currency": "EUR"}"#).unwrap();
        assert_eq!(s.currency, "EUR");
        assert_eq!(s.user_id, DEFAULT_USER);
        assert!(!s.data_dir.is_empty());
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(load_settings_from(&path).currency, DEFAULT_CURRENCY);
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/path"), "/abs/path");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/x"), format!("{}/x", home.to_string_lossy()));
        }
    }
}
