use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::domain::{AppConfig, DomainError};
use crate::ports::ConfigStore;

const APP_DIR: &str = "VoiceTranslator";

/// TOML-based configuration store with OS-specific paths.
pub struct TomlConfigStore {
    data_dir: PathBuf,
    logs_dir: PathBuf,
}

impl TomlConfigStore {
    /// Create a store in the OS-specific application directories.
    pub fn new() -> Result<Self, DomainError> {
        let data_dir = dirs::config_dir()
            .map(|p| p.join(APP_DIR))
            .ok_or_else(|| {
                DomainError::Config("Could not find application config directory".to_string())
            })?;
        let logs_dir = Self::default_logs_dir(&data_dir);
        Self::at(data_dir, logs_dir)
    }

    /// Create a store rooted at an explicit directory (logs go to `<dir>/logs`).
    pub fn with_data_dir(data_dir: PathBuf) -> Result<Self, DomainError> {
        let logs_dir = data_dir.join("logs");
        Self::at(data_dir, logs_dir)
    }

    fn at(data_dir: PathBuf, logs_dir: PathBuf) -> Result<Self, DomainError> {
        fs::create_dir_all(&data_dir)?;
        info!(data_dir = ?data_dir, "ConfigStore initialized");
        Ok(Self { data_dir, logs_dir })
    }

    /// Get the OS-specific log directory.
    /// - macOS: ~/Library/Application Support/VoiceTranslator/logs/
    /// - Windows: %LOCALAPPDATA%\VoiceTranslator\logs\
    /// - Linux: ~/.local/share/VoiceTranslator/logs/
    fn default_logs_dir(data_dir: &std::path::Path) -> PathBuf {
        #[cfg(target_os = "macos")]
        {
            data_dir.join("logs")
        }

        #[cfg(target_os = "windows")]
        {
            dirs::data_local_dir()
                .map(|p| p.join(APP_DIR).join("logs"))
                .unwrap_or_else(|| data_dir.join("logs"))
        }

        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            dirs::data_dir()
                .map(|p| p.join(APP_DIR).join("logs"))
                .unwrap_or_else(|| data_dir.join("logs"))
        }
    }
}

impl ConfigStore for TomlConfigStore {
    fn load(&self) -> Result<AppConfig, DomainError> {
        let config_path = self.config_path();

        if config_path.exists() {
            debug!(path = ?config_path, "Loading configuration");
            let content = fs::read_to_string(&config_path)?;
            let config: AppConfig = toml::from_str(&content)?;
            info!(path = ?config_path, "Configuration loaded");
            Ok(config)
        } else {
            info!(path = ?config_path, "Configuration file not found, creating default");
            let config = AppConfig::new();
            self.save(&config)?;
            Ok(config)
        }
    }

    fn save(&self, config: &AppConfig) -> Result<(), DomainError> {
        let config_path = self.config_path();

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&config_path, content)?;

        info!(path = ?config_path, "Configuration saved");
        Ok(())
    }

    fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.toml")
    }

    fn data_dir(&self) -> PathBuf {
        self.data_dir.clone()
    }

    fn logs_dir(&self) -> PathBuf {
        self.logs_dir.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TranslationMode;

    #[test]
    fn test_config_store_paths() {
        let temp = tempfile::tempdir().unwrap();
        let store = TomlConfigStore::with_data_dir(temp.path().to_path_buf()).unwrap();

        assert!(store.config_path().ends_with("config.toml"));
        assert!(store.logs_dir().ends_with("logs"));
        assert_eq!(store.data_dir(), temp.path());
    }

    #[test]
    fn test_missing_file_creates_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let store = TomlConfigStore::with_data_dir(temp.path().to_path_buf()).unwrap();

        let config = store.load().unwrap();
        assert!(store.config_path().exists());
        assert_eq!(config.pipeline.default_mode, "pt-es");
    }

    #[test]
    fn test_config_roundtrip() {
        let temp = tempfile::tempdir().unwrap();
        let store = TomlConfigStore::with_data_dir(temp.path().to_path_buf()).unwrap();

        let mut config = AppConfig::new();
        config.logging.level = "debug".to_string();
        config.recognition.silence_timeout_ms = 4000;
        config.pipeline.default_mode = "auto-pt".to_string();
        store.save(&config).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.logging.level, "debug");
        assert_eq!(loaded.recognition.silence_timeout_ms, 4000);
        assert_eq!(loaded.pipeline.default_mode, "auto-pt");
        assert_eq!(loaded.languages, config.languages);
        assert_eq!(loaded.modes, config.modes);
        assert!(loaded
            .modes
            .iter()
            .any(|m| matches!(m.mode, TranslationMode::AutoDetect { .. })));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let store = TomlConfigStore::with_data_dir(temp.path().to_path_buf()).unwrap();

        let mut config = AppConfig::new();
        config.pipeline.continuous = false;
        store.save(&config).unwrap();

        let reset = store.reset().unwrap();
        assert!(reset.pipeline.continuous);
        assert!(store.load().unwrap().pipeline.continuous);
    }
}
