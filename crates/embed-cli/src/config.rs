//! Effective build configuration
//!
//! Layers CLI flags over the merged `embed.toml` / user / environment
//! configuration and freezes the result into a [`BuildConfig`].

use anyhow::{Context, Result};
use embed_build::{BuildConfig, ToolPrograms};
use embed_config::{Config, ConfigLoader};
use std::env;
use std::path::{Path, PathBuf};

/// Flags shared by every build command
#[derive(Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Directory to start the embed.toml search from
    pub project_dir: Option<PathBuf>,
    /// Board identifier
    pub board: Option<String>,
    /// Serial port
    pub port: Option<String>,
    /// Arduino distribution root
    pub toolchain_root: Option<PathBuf>,
}

/// Load configuration files and resolve the build configuration
pub fn load(args: &ProjectArgs) -> Result<BuildConfig> {
    let start_dir = match &args.project_dir {
        Some(dir) => dir.clone(),
        None => env::current_dir().context("Failed to determine current directory")?,
    };

    let config = ConfigLoader::new()
        .load_from_directory(&start_dir)
        .context("Failed to load configuration")?;

    resolve(args, &config, &start_dir)
}

/// Apply CLI flags over loaded configuration
///
/// Relative paths from embed.toml are anchored at the directory holding it;
/// without a project file the start directory is the project root.
pub fn resolve(args: &ProjectArgs, config: &Config, start_dir: &Path) -> Result<BuildConfig> {
    let root = config.project_root().unwrap_or(start_dir);
    let mut builder = BuildConfig::builder().project_root(root);

    if let Some(board) = args.board.as_deref().or(config.board_name()) {
        builder = builder.board_name(board)?;
    }

    if let Some(build) = &config.project.build {
        if let Some(source) = &build.source {
            builder = builder.src_dir(source);
        }
        if let Some(include) = &build.include {
            builder = builder.include_dir(include);
        }
        if let Some(output) = &build.output {
            builder = builder.build_dir(output);
        }
        if let Some(archive) = &build.archive {
            builder = builder.archive(archive);
        }
        if let Some(libraries) = &build.libraries {
            builder = builder.libraries(libraries.iter().cloned());
        }
    }

    if let Some(toolchain_root) = args.toolchain_root.as_deref().or(config.toolchain_root()) {
        builder = builder.toolchain_root(toolchain_root);
    }
    if let Some(port) = args.port.as_deref().or(config.port()) {
        builder = builder.port(port);
    }

    Ok(builder.programs(programs(config)).build())
}

/// Default program names with embed.toml overrides applied
fn programs(config: &Config) -> ToolPrograms {
    let mut programs = ToolPrograms::default();
    let Some(toolchain) = &config.project.toolchain else {
        return programs;
    };

    let overrides = [
        (&toolchain.cc, &mut programs.cc),
        (&toolchain.cxx, &mut programs.cxx),
        (&toolchain.ar, &mut programs.ar),
        (&toolchain.objcopy, &mut programs.objcopy),
        (&toolchain.size, &mut programs.size),
        (&toolchain.uploader, &mut programs.uploader),
    ];
    for (value, slot) in overrides {
        if let Some(value) = value {
            *slot = value.clone();
        }
    }
    programs
}
