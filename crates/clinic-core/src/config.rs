//! Clinic configuration loaded from TOML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::ShareSplit;

/// Environment variable overriding [`ClinicConfig::database_path`].
pub const DB_PATH_ENV: &str = "CLINIC_DB_PATH";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Runtime configuration. Every key is optional in the file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClinicConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Directory for uploaded patient images
    pub images_dir: PathBuf,
    /// Clinic percentage for pairs without a configured split
    pub default_clinic_percentage: f64,
    /// Doctor percentage for pairs without a configured split
    pub default_doctor_percentage: f64,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        let split = ShareSplit::default();
        Self {
            database_path: PathBuf::from("clinic.db"),
            images_dir: PathBuf::from("images"),
            default_clinic_percentage: split.clinic_percentage,
            default_doctor_percentage: split.doctor_percentage,
        }
    }
}

impl ClinicConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), "configuration loaded");
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(self) -> Self {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    fn apply_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(DB_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            self.database_path = PathBuf::from(path);
        }
        self
    }

    /// Split applied when a (treatment, doctor) pair has no configuration.
    pub fn default_split(&self) -> ShareSplit {
        ShareSplit::new(self.default_clinic_percentage, self.default_doctor_percentage)
    }
}
