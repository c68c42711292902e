pub mod clean;
pub mod hex;
pub mod install;
pub mod targets;

use crate::config::{self, ProjectArgs};
use anyhow::{Context, Result};
use embed_build::{BuildConfig, BuildReport, Pipeline, SystemToolchain, Target};
use std::rc::Rc;

/// Load the project and declare its pipeline against the real toolchain
pub fn pipeline(args: &ProjectArgs) -> Result<Pipeline> {
    let config = config::load(args)?;
    Ok(Pipeline::new(config, Rc::new(SystemToolchain)))
}

/// Run one target and hand back what it did
pub fn run_target(pipeline: &Pipeline, target: Target) -> Result<BuildReport> {
    pipeline
        .run(target)
        .with_context(|| format!("`{}' failed", target))
}

/// Machine-readable summary of a target run
pub fn report_json(target: Target, config: &BuildConfig, report: &BuildReport) -> String {
    serde_json::json!({
        "success": true,
        "target": target,
        "board": config.board.kind,
        "executed": report.executed,
        "up_to_date": report.up_to_date,
        "elapsed": report.elapsed.as_secs_f64(),
    })
    .to_string()
}
