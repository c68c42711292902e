//! Clean command - remove the build directory

use super::{pipeline, report_json, run_target};
use crate::config::ProjectArgs;
use anyhow::Result;
use embed_build::Target;

pub fn run(args: &ProjectArgs, json: bool) -> Result<()> {
    let pipeline = pipeline(args)?;
    let report = run_target(&pipeline, Target::Clean)?;

    if json {
        println!("{}", report_json(Target::Clean, pipeline.config(), &report));
    }
    Ok(())
}
