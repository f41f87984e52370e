use std::path::PathBuf;

use crate::domain::{AppConfig, DomainError};

/// Port for reading and writing the translator configuration file.
pub trait ConfigStore: Send + Sync {
    /// Load the configuration, writing the defaults first if no file exists.
    fn load(&self) -> Result<AppConfig, DomainError>;

    /// Persist the configuration.
    fn save(&self, config: &AppConfig) -> Result<(), DomainError>;

    /// Overwrite the stored configuration with the defaults and return them.
    fn reset(&self) -> Result<AppConfig, DomainError> {
        let config = AppConfig::default();
        self.save(&config)?;
        Ok(config)
    }

    /// Path of the configuration file.
    fn config_path(&self) -> PathBuf;

    /// Application data directory.
    fn data_dir(&self) -> PathBuf;

    /// Directory receiving rotated log files.
    fn logs_dir(&self) -> PathBuf;
}
