use crate::error::SpeechResult;
use crate::remote::{DEFAULT_CLIENT_ID, DEFAULT_MIRRORS};
use crate::settings::Settings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Speech defaults
    pub settings: Settings,

    // Remote fallback
    pub remote_fallback: bool,
    pub mirrors: Vec<String>,
    pub client_id: String,
    pub mirror_start_timeout_ms: u64,

    // Voice catalog
    pub voice_load_attempts: usize,
    pub voice_retry_delay_ms: u64,
    pub voices_changed_timeout_ms: u64,

    // Diagnostics
    pub probe_delay_ms: u64,

    // Meta
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            remote_fallback: true,
            mirrors: DEFAULT_MIRRORS.iter().map(|s| s.to_string()).collect(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            mirror_start_timeout_ms: 10_000,
            voice_load_attempts: 3,
            voice_retry_delay_ms: 1000,
            voices_changed_timeout_ms: 3000,
            probe_delay_ms: 1000,
            log_level: "INFO".to_string(),
        }
    }
}

impl Config {
    /// Load config from the default location, or use defaults
    pub fn load() -> SpeechResult<Self> {
        Self::load_from(&config_path())
    }

    /// Load config from `path`. A missing file yields defaults; a corrupt
    /// one is moved aside to `*.json.corrupt` and defaults are used.
    pub fn load_from(path: &Path) -> SpeechResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                // Graceful degradation: log warning and use defaults
                tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                // Backup corrupt file for debugging
                let backup_path = path.with_extension("json.corrupt");
                let _ = std::fs::rename(path, &backup_path);
                Ok(Self::default())
            }
        }
    }

    pub fn mirror_start_timeout(&self) -> Duration {
        Duration::from_millis(self.mirror_start_timeout_ms)
    }

    pub fn voice_retry_delay(&self) -> Duration {
        Duration::from_millis(self.voice_retry_delay_ms)
    }

    pub fn voices_changed_timeout(&self) -> Duration {
        Duration::from_millis(self.voices_changed_timeout_ms)
    }

    pub fn probe_delay(&self) -> Duration {
        Duration::from_millis(self.probe_delay_ms)
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("speakwise")
        .join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.remote_fallback);
        assert_eq!(config.mirrors.len(), 3);
        assert_eq!(config.client_id, "tw-ob");
        assert_eq!(config.voice_load_attempts, 3);
        assert_eq!(config.voice_retry_delay(), Duration::from_secs(1));
        assert_eq!(config.settings.language, "zh-TW");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"remote_fallback": false, "settings": {"rate": 1.0, "pitch": 1.0, "volume": 0.5, "lang": "ja-JP"}}"#)
            .expect("Failed to write config");

        let config = Config::load_from(&path).expect("Failed to load");
        assert!(!config.remote_fallback);
        assert_eq!(config.settings.language, "ja-JP");
        assert_eq!(config.settings.volume, 0.5);
        assert_eq!(config.mirrors.len(), 3);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = Config::load_from(&dir.path().join("nope.json")).expect("Failed to load");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_corrupt_json_handling() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not valid json").expect("Failed to write config");

        let config = Config::load_from(&path).expect("Failed to load");
        assert_eq!(config, Config::default());
        assert!(!path.exists());
        assert!(dir.path().join("config.json.corrupt").exists());
    }
}
