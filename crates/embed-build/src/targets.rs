//! Named build targets exposed to callers

use crate::error::{BuildError, BuildResult};
use serde::Serialize;
use std::str::FromStr;

/// Task a caller can request by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// Produce the flashable image
    Hex,
    /// Upload the image to the board
    Install,
    /// Remove every build output
    Clean,
}

impl Target {
    /// All targets, in listing order
    pub fn all() -> [Target; 3] {
        [Self::Hex, Self::Install, Self::Clean]
    }

    /// Task name in the graph
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hex => "hex",
            Self::Install => "install",
            Self::Clean => "clean",
        }
    }

    /// One-line help text
    pub fn description(&self) -> &'static str {
        match self {
            Self::Hex => "Build the hex file",
            Self::Install => "Install program on USB board",
            Self::Clean => "Remove build directory",
        }
    }
}

impl FromStr for Target {
    type Err = BuildError;

    fn from_str(s: &str) -> BuildResult<Self> {
        Self::all()
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| BuildError::InvalidArgument(format!("unknown target: `{}'", s)))
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
