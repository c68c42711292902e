//! Build system error types

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

/// Which directory of a library could not be located
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirKind {
    Source,
    Include,
}

impl std::fmt::Display for DirKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Include => write!(f, "include"),
        }
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Cannot find {kind} directory for library '{library}' (tried: {tried})")]
    ResolutionFailure {
        library: String,
        kind: DirKind,
        tried: String,
    },

    #[error("Command '{program}' failed: {reason}")]
    ToolchainFailure { program: String, reason: String },

    #[error("Don't know how to build '{target}'")]
    NoRule { target: PathBuf },

    #[error("Sources '{first}' and '{second}' both compile to '{object}'")]
    DuplicateObject {
        object: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("I/O error at {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl BuildError {
    /// Create an unknown board error
    pub fn unknown_board(identifier: &str) -> Self {
        Self::InvalidArgument(format!("unknown board: `{}'", identifier))
    }

    /// Create a library resolution error listing every candidate probed
    pub fn resolution(library: impl Into<String>, kind: DirKind, tried: &[PathBuf]) -> Self {
        Self::ResolutionFailure {
            library: library.into(),
            kind,
            tried: tried
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Create a toolchain failure from a process exit status
    pub fn exit_status(program: impl Into<String>, status: ExitStatus) -> Self {
        let reason = match status.code() {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        };
        Self::ToolchainFailure {
            program: program.into(),
            reason,
        }
    }

    /// Create a toolchain failure for a process that could not be started
    pub fn spawn(program: impl Into<String>, error: impl ToString) -> Self {
        Self::ToolchainFailure {
            program: program.into(),
            reason: error.to_string(),
        }
    }

    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }

    /// Create a missing rule error
    pub fn no_rule(target: impl Into<PathBuf>) -> Self {
        Self::NoRule {
            target: target.into(),
        }
    }
}
