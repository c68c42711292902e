//! Embed Configuration System
//!
//! Provides configuration management for firmware projects:
//! - Project configuration (embed.toml)
//! - Global user configuration (~/.embed/config.toml)
//! - Environment overrides (PORT, EMBED_BOARD, EMBED_TOOLCHAIN_ROOT)
//!
//! # Configuration Hierarchy
//!
//! Configuration is merged in the following order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Global config (~/.embed/config.toml)
//! 3. Project config (./embed.toml)
//! 4. Environment variables
//! 5. CLI flags
//!
//! # Example
//!
//! ```no_run
//! use embed_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("board: {:?}", config.board_name());
//! ```

pub mod global;
pub mod loader;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use global::GlobalConfig;
pub use loader::{Config, ConfigLoader, ENV_BOARD, ENV_PORT, ENV_TOOLCHAIN_ROOT, PROJECT_FILE};
pub use project::ProjectConfig;
