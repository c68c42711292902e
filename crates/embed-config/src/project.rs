//! Project Configuration (embed.toml)
//!
//! Handles project-level configuration stored in `embed.toml` at the project root.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project configuration from embed.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Target board
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board: Option<BoardSection>,

    /// Source layout and libraries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildSection>,

    /// Toolchain location and program names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toolchain: Option<ToolchainSection>,

    /// Upload settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload: Option<UploadSection>,
}

/// Board selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct BoardSection {
    /// Board identifier ("uno", "micro")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Build layout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    /// Project source directory (default: "src")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,

    /// Project header directory (default: "include")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<PathBuf>,

    /// Libraries archived into the core archive (default: ["arduino"])
    #[serde(skip_serializing_if = "Option::is_none")]
    pub libraries: Option<Vec<String>>,

    /// Output directory (default: "build")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Core archive path (default: "<output>/libcore.a")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<PathBuf>,
}

/// Toolchain location and program overrides
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ToolchainSection {
    /// Arduino distribution root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cxx: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ar: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub objcopy: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,
}

/// Upload settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct UploadSection {
    /// Serial port of the board
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
}

impl ProjectConfig {
    /// Load project configuration from a file
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

    /// Validate the project configuration
    ///
    /// Board names are checked against the registry by the caller; this only
    /// rejects values no build could use.
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(name) = self.board_name() {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "board.name".to_string(),
                    reason: "name cannot be empty".to_string(),
                });
            }
        }

        if let Some(libraries) = self.libraries() {
            for library in libraries {
                validate_library_name(library)?;
            }
        }

        if let Some(toolchain) = &self.toolchain {
            let programs = [
                ("toolchain.cc", &toolchain.cc),
                ("toolchain.cxx", &toolchain.cxx),
                ("toolchain.ar", &toolchain.ar),
                ("toolchain.objcopy", &toolchain.objcopy),
                ("toolchain.size", &toolchain.size),
                ("toolchain.uploader", &toolchain.uploader),
            ];
            for (field, program) in programs {
                if program.as_deref().is_some_and(|p| p.trim().is_empty()) {
                    return Err(ConfigError::InvalidValue {
                        field: field.to_string(),
                        reason: "program cannot be empty".to_string(),
                    });
                }
            }
        }

        if self.port().is_some_and(|p| p.is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "upload.port".to_string(),
                reason: "port cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Get the board name, if present
    pub fn board_name(&self) -> Option<&str> {
        self.board.as_ref().and_then(|b| b.name.as_deref())
    }

    /// Get the library list, if present
    pub fn libraries(&self) -> Option<&[String]> {
        self.build.as_ref().and_then(|b| b.libraries.as_deref())
    }

    /// Get the toolchain root, if present
    pub fn toolchain_root(&self) -> Option<&Path> {
        self.toolchain.as_ref().and_then(|t| t.root.as_deref())
    }

    /// Get the upload port, if present
    pub fn port(&self) -> Option<&str> {
        self.upload.as_ref().and_then(|u| u.port.as_deref())
    }

    pub(crate) fn set_board_name(&mut self, name: String) {
        self.board.get_or_insert_with(Default::default).name = Some(name);
    }

    pub(crate) fn set_toolchain_root(&mut self, root: PathBuf) {
        self.toolchain.get_or_insert_with(Default::default).root = Some(root);
    }

    pub(crate) fn set_port(&mut self, port: String) {
        self.upload.get_or_insert_with(Default::default).port = Some(port);
    }
}

/// Library names become directory names under the build root
fn validate_library_name(name: &str) -> ConfigResult<()> {
    if name.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "build.libraries".to_string(),
            reason: "library name cannot be empty".to_string(),
        });
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(ConfigError::InvalidValue {
            field: "build.libraries".to_string(),
            reason: format!("'{}' is not a plain directory name", name),
        });
    }
    Ok(())
}
