//! AVR firmware build infrastructure
//!
//! Provides incremental builds of Arduino-style projects:
//! - Board registry (MCU, variant, defines, upload parameters)
//! - Library directory discovery and object/source path mapping
//! - File-based task graph with staleness checks
//! - AVR toolchain argument construction
//! - The fixed sources → objects → archive → ELF → HEX pipeline

pub mod board;
pub mod config;
pub mod error;
pub mod graph;
pub mod pipeline;
pub mod resolver;
pub mod targets;
pub mod toolchain;

// Re-export main types
pub use board::{BoardConfig, BoardKind};
pub use config::{BuildConfig, BuildConfigBuilder, ToolPrograms};
pub use error::{BuildError, BuildResult, DirKind};
pub use graph::{Action, BuildReport, Dependency, Prerequisites, TaskGraph};
pub use pipeline::Pipeline;
pub use resolver::{Namespace, PathResolver};
pub use targets::Target;
pub use toolchain::{Flags, Invocation, SystemToolchain, Tool, Toolchain};
