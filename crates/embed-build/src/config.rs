//! Build configuration
//!
//! [`BuildConfig`] is an immutable value assembled by [`BuildConfigBuilder`]
//! before any rule is declared. The pipeline reads it by reference only.

use crate::board::{BoardConfig, BoardKind};
use crate::error::BuildResult;
use std::path::PathBuf;

pub const DEFAULT_BUILD_DIR: &str = "build";
pub const DEFAULT_ARCHIVE: &str = "build/libcore.a";
pub const DEFAULT_SRC_DIR: &str = "src";
pub const DEFAULT_INCLUDE_DIR: &str = "include";
pub const DEFAULT_LIBRARIES_DIR: &str = "libraries";
pub const DEFAULT_TOOLCHAIN_ROOT: &str = "/usr/local/arduino";
pub const DEFAULT_PORT: &str = "/dev/cuaU1";
pub const CORE_LIBRARY: &str = "arduino";

const ARCHIVE_NAME: &str = "libcore.a";
const ELF_NAME: &str = "main.elf";
const HEX_NAME: &str = "main.hex";

/// Names of the external programs the pipeline shells out to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPrograms {
    pub cc: String,
    pub cxx: String,
    pub ar: String,
    pub objcopy: String,
    pub size: String,
    pub uploader: String,
}

impl Default for ToolPrograms {
    fn default() -> Self {
        Self {
            cc: "avr-gcc".to_string(),
            cxx: "avr-g++".to_string(),
            ar: "avr-ar".to_string(),
            objcopy: "avr-objcopy".to_string(),
            size: "avr-size".to_string(),
            uploader: "avrdude".to_string(),
        }
    }
}

/// Frozen build configuration
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Root of every build output
    pub build_dir: PathBuf,
    /// Static archive holding all library objects
    pub archive: PathBuf,
    /// Library names, in link order
    pub libraries: Vec<String>,
    /// Project sources
    pub src_dir: PathBuf,
    /// Project headers
    pub include_dir: PathBuf,
    /// Project-local library checkouts
    pub libraries_dir: PathBuf,
    /// Arduino distribution root
    pub toolchain_root: PathBuf,
    /// Selected board
    pub board: BoardConfig,
    /// Serial port used by `install`
    pub port: String,
    /// External program names
    pub programs: ToolPrograms,
}

impl BuildConfig {
    /// Start from the documented defaults
    pub fn builder() -> BuildConfigBuilder {
        BuildConfigBuilder::new()
    }

    /// Linked image
    pub fn elf_path(&self) -> PathBuf {
        self.build_dir.join(ELF_NAME)
    }

    /// Flashable Intel HEX image
    pub fn hex_path(&self) -> PathBuf {
        self.build_dir.join(HEX_NAME)
    }

    /// Object directory of one library
    pub fn library_build_dir(&self, library: &str) -> PathBuf {
        self.build_dir.join(library)
    }

    /// Object directories of all configured libraries
    pub fn library_build_dirs(&self) -> Vec<PathBuf> {
        self.libraries
            .iter()
            .map(|lib| self.library_build_dir(lib))
            .collect()
    }

    /// Arduino core sources and headers
    pub fn core_dir(&self) -> PathBuf {
        self.toolchain_root
            .join("hardware/arduino/avr/cores")
            .join(CORE_LIBRARY)
    }

    /// Pinout headers for the selected board
    pub fn variant_dir(&self) -> PathBuf {
        self.toolchain_root
            .join("hardware/arduino/avr/variants")
            .join(&self.board.variant)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfigBuilder::new().build()
    }
}

/// Collects overrides, then produces a [`BuildConfig`]
///
/// Relative paths are anchored at the project root when one is set.
#[derive(Debug, Clone, Default)]
pub struct BuildConfigBuilder {
    project_root: Option<PathBuf>,
    build_dir: Option<PathBuf>,
    archive: Option<PathBuf>,
    libraries: Option<Vec<String>>,
    src_dir: Option<PathBuf>,
    include_dir: Option<PathBuf>,
    libraries_dir: Option<PathBuf>,
    toolchain_root: Option<PathBuf>,
    board: Option<BoardKind>,
    port: Option<String>,
    programs: Option<ToolPrograms>,
}

impl BuildConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory all relative paths are resolved against
    pub fn project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    pub fn build_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.build_dir = Some(dir.into());
        self
    }

    pub fn archive(mut self, path: impl Into<PathBuf>) -> Self {
        self.archive = Some(path.into());
        self
    }

    pub fn libraries<I, S>(mut self, libraries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.libraries = Some(libraries.into_iter().map(Into::into).collect());
        self
    }

    pub fn src_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.src_dir = Some(dir.into());
        self
    }

    pub fn include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dir = Some(dir.into());
        self
    }

    pub fn libraries_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.libraries_dir = Some(dir.into());
        self
    }

    pub fn toolchain_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.toolchain_root = Some(dir.into());
        self
    }

    pub fn board(mut self, kind: BoardKind) -> Self {
        self.board = Some(kind);
        self
    }

    /// Select a board by identifier; unknown identifiers fail here
    pub fn board_name(self, identifier: &str) -> BuildResult<Self> {
        let kind = identifier.parse::<BoardKind>()?;
        Ok(self.board(kind))
    }

    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    pub fn programs(mut self, programs: ToolPrograms) -> Self {
        self.programs = Some(programs);
        self
    }

    /// Freeze the configuration
    pub fn build(self) -> BuildConfig {
        let root = self.project_root;
        let anchor = |path: Option<PathBuf>, default: &str| -> PathBuf {
            let path = path.unwrap_or_else(|| PathBuf::from(default));
            match &root {
                Some(root) => root.join(path),
                None => path,
            }
        };

        let build_dir = anchor(self.build_dir, DEFAULT_BUILD_DIR);
        // The archive follows a relocated build dir unless set explicitly
        let archive = match self.archive {
            Some(path) => anchor(Some(path), DEFAULT_ARCHIVE),
            None => build_dir.join(ARCHIVE_NAME),
        };

        BuildConfig {
            build_dir,
            archive,
            libraries: self
                .libraries
                .unwrap_or_else(|| vec![CORE_LIBRARY.to_string()]),
            src_dir: anchor(self.src_dir, DEFAULT_SRC_DIR),
            include_dir: anchor(self.include_dir, DEFAULT_INCLUDE_DIR),
            libraries_dir: anchor(self.libraries_dir, DEFAULT_LIBRARIES_DIR),
            toolchain_root: anchor(self.toolchain_root, DEFAULT_TOOLCHAIN_ROOT),
            board: self.board.unwrap_or(BoardKind::Uno).config(),
            port: self.port.unwrap_or_else(|| DEFAULT_PORT.to_string()),
            programs: self.programs.unwrap_or_default(),
        }
    }
}
