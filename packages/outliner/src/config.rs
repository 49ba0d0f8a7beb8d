use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::ConfigError;

pub const DEFAULT_CONFIG_NAME: &str = "outliner.config.json";

/// Outliner configuration file format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlinerConfig {
    /// Quiet period before a snapshot write is committed
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Prefix joined with the provider id to form the storage key
    #[serde(default = "default_storage_key_prefix")]
    pub storage_key_prefix: String,

    /// Deepest nesting level an outline item may reach
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    #[serde(default)]
    pub read_only: bool,

    /// Directory used by file-backed storage, relative to the config file
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,
}

fn default_debounce_ms() -> u64 {
    800
}

fn default_storage_key_prefix() -> String {
    "outliner-".to_string()
}

fn default_max_depth() -> u32 {
    8
}

fn default_storage_dir() -> String {
    ".outliner".to_string()
}

impl OutlinerConfig {
    /// Load config from a directory, falling back to defaults if none exists
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let config_path = dir.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: OutlinerConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(OutlinerConfig::default())
        }
    }

    /// Write this config into `dir`, returning the file path
    pub fn save(&self, dir: &Path) -> Result<PathBuf, ConfigError> {
        let config_path = dir.join(DEFAULT_CONFIG_NAME);
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(config_path)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Storage key for a provider id (`outliner-<id>` with the default prefix)
    pub fn storage_key(&self, id: &str) -> String {
        format!("{}{}", self.storage_key_prefix, id)
    }

    pub fn get_storage_dir(&self, dir: &Path) -> PathBuf {
        dir.join(&self.storage_dir)
    }
}

impl Default for OutlinerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            storage_key_prefix: default_storage_key_prefix(),
            max_depth: default_max_depth(),
            read_only: false,
            storage_dir: default_storage_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "debounceMs": 250,
            "storageKeyPrefix": "notes-",
            "readOnly": true
        }"#;

        let config: OutlinerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.debounce(), Duration::from_millis(250));
        assert_eq!(config.storage_key("demo"), "notes-demo");
        assert!(config.read_only);
        assert_eq!(config.max_depth, 8);
        assert_eq!(config.storage_dir, ".outliner");
    }

    #[test]
    fn test_default_config() {
        let config = OutlinerConfig::default();
        assert_eq!(config.debounce_ms, 800);
        assert_eq!(config.storage_key("demo"), "outliner-demo");
        assert!(!config.read_only);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = OutlinerConfig::load(dir.path()).unwrap();
        assert_eq!(config, OutlinerConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = OutlinerConfig {
            max_depth: 3,
            ..OutlinerConfig::default()
        };

        let path = config.save(dir.path()).unwrap();
        assert!(path.ends_with(DEFAULT_CONFIG_NAME));
        assert_eq!(OutlinerConfig::load(dir.path()).unwrap(), config);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), "{ nope").unwrap();
        assert!(matches!(
            OutlinerConfig::load(dir.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
