use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::persistence::StorageKeys;

pub const CONFIG_FILE_NAME: &str = "parkwise.json";

/// Runtime knobs for the parking core. Every field has a default, so a
/// partial or missing config file is fine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreConfig {
    pub key_prefix: String,
    /// Hourly rate used when the selected zone carries no usable price.
    pub fallback_hourly_rate: f64,
    /// Oldest notifications are dropped beyond this many entries.
    pub notification_limit: usize,
    pub data_dir: Option<PathBuf>,
    pub debug: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            key_prefix: "parkwise".into(),
            fallback_hourly_rate: 2.0,
            notification_limit: 100,
            data_dir: None,
            debug: false,
        }
    }
}

impl CoreConfig {
    /// Reads the config file if it exists. An unparseable file falls back to
    /// defaults; only an unreadable file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        Ok(serde_json::from_str(&contents).unwrap_or_default())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Applies `PARKWISE_DEBUG`, `PARKWISE_DATA_DIR` and `PARKWISE_FALLBACK_RATE`.
    pub fn apply_env(self) -> Self {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = lookup("PARKWISE_DEBUG") {
            self.debug = value == "1" || value.eq_ignore_ascii_case("true");
        }
        if let Some(value) = lookup("PARKWISE_DATA_DIR") {
            if !value.trim().is_empty() {
                self.data_dir = Some(PathBuf::from(value));
            }
        }
        if let Some(rate) = lookup("PARKWISE_FALLBACK_RATE")
            .and_then(|value| value.trim().parse::<f64>().ok())
            .filter(|rate| rate.is_finite() && *rate >= 0.0)
        {
            self.fallback_hourly_rate = rate;
        }
        self
    }

    pub fn storage_keys(&self) -> StorageKeys {
        StorageKeys::with_prefix(&self.key_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = CoreConfig::load(&dir.path().join(CONFIG_FILE_NAME)).expect("load");
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{"fallbackHourlyRate": 3.5}"#).expect("write");

        let config = CoreConfig::load(&path).expect("load");
        assert_eq!(config.fallback_hourly_rate, 3.5);
        assert_eq!(config.key_prefix, "parkwise");
        assert_eq!(config.notification_limit, 100);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "{not json").expect("write");
        assert_eq!(CoreConfig::load(&path).expect("load"), CoreConfig::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = CoreConfig {
            key_prefix: "fleet".into(),
            notification_limit: 20,
            ..CoreConfig::default()
        };
        config.save(&path).expect("save");
        assert_eq!(CoreConfig::load(&path).expect("load"), config);
    }

    #[test]
    fn env_overrides_apply_and_ignore_garbage() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("PARKWISE_DEBUG", "TRUE"),
            ("PARKWISE_DATA_DIR", "/tmp/parkwise"),
            ("PARKWISE_FALLBACK_RATE", "not-a-number"),
        ]);
        let config = CoreConfig::default()
            .apply_overrides(|name| vars.get(name).map(|value| value.to_string()));

        assert!(config.debug);
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/parkwise")));
        assert_eq!(config.fallback_hourly_rate, 2.0);
    }
}
