//! Hex command - compile, archive, link and convert to Intel HEX

use super::{pipeline, report_json, run_target};
use crate::config::ProjectArgs;
use anyhow::Result;
use embed_build::Target;

pub fn run(args: &ProjectArgs, json: bool) -> Result<()> {
    let pipeline = pipeline(args)?;
    let report = run_target(&pipeline, Target::Hex)?;
    let config = pipeline.config();

    if json {
        println!("{}", report_json(Target::Hex, config, &report));
    } else if report.is_noop() {
        log::info!("{} is up to date", config.hex_path().display());
    } else {
        log::info!(
            "Built {} for {} in {:.2}s ({} steps, {} up to date)",
            config.hex_path().display(),
            config.board.kind,
            report.elapsed.as_secs_f64(),
            report.executed.len(),
            report.up_to_date
        );
    }
    Ok(())
}
