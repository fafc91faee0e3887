use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File name looked up in the working directory when no config is given.
pub const DEFAULT_CONFIG_FILE: &str = "sealcheck.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Defaults for a verification run, overridable from the command line.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct VerifyConfig {
    #[serde(default)]
    pub base_directory: Option<String>,
    #[serde(default)]
    pub jobs: Option<usize>,
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
}

impl VerifyConfig {
    pub fn parse_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::parse_str(&content)?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `sealcheck.toml` from `dir` if it exists.
    pub fn discover(dir: &Path) -> Result<Option<Self>, ConfigError> {
        let path = dir.join(DEFAULT_CONFIG_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        Self::load(&path).map(Some)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jobs == Some(0) {
            return Err(ConfigError::Invalid("jobs must be at least 1".to_owned()));
        }
        if let Some(base) = &self.base_directory {
            if base.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "base_directory must not be empty".to_owned(),
                ));
            }
        }
        Ok(())
    }

    /// Overlay values set in `overrides` onto `self`.
    #[must_use]
    pub fn merged_with(self, overrides: VerifyConfig) -> Self {
        Self {
            base_directory: overrides.base_directory.or(self.base_directory),
            jobs: overrides.jobs.or(self.jobs),
            work_dir: overrides.work_dir.or(self.work_dir),
        }
    }
}
