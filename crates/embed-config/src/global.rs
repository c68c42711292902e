//! Global Configuration (~/.embed/config.toml)
//!
//! Handles user-level defaults stored in `~/.embed/config.toml`: where the
//! Arduino distribution lives and which serial port the board is usually on.

use crate::project::UploadSection;
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.embed/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Default toolchain location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toolchain: Option<GlobalToolchainConfig>,

    /// Default upload settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload: Option<UploadSection>,
}

/// Toolchain defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalToolchainConfig {
    /// Arduino distribution root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the global configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.port().is_some_and(|p| p.is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "upload.port".to_string(),
                reason: "port cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Get the global config file path (~/.embed/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".embed").join("config.toml"))
    }

    /// Get the default toolchain root
    pub fn toolchain_root(&self) -> Option<&Path> {
        self.toolchain.as_ref().and_then(|t| t.root.as_deref())
    }

    /// Get the default upload port
    pub fn port(&self) -> Option<&str> {
        self.upload.as_ref().and_then(|u| u.port.as_deref())
    }

    /// Merge another global config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &GlobalConfig) {
        if other.toolchain.is_some() {
            self.toolchain = other.toolchain.clone();
        }
        if other.upload.is_some() {
            self.upload = other.upload.clone();
        }
    }
}
