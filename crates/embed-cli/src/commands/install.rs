//! Install command - bring the image up to date and flash it

use super::{pipeline, report_json, run_target};
use crate::config::ProjectArgs;
use anyhow::Result;
use embed_build::Target;

pub fn run(args: &ProjectArgs, json: bool) -> Result<()> {
    let pipeline = pipeline(args)?;
    let config = pipeline.config();
    log::debug!(
        "uploading to {} via {} at {} baud",
        config.port,
        config.board.programmer,
        config.board.upload_baud_rate
    );

    let report = run_target(&pipeline, Target::Install)?;

    if json {
        println!("{}", report_json(Target::Install, config, &report));
    } else {
        log::info!(
            "Installed {} on {}",
            config.hex_path().display(),
            config.port
        );
    }
    Ok(())
}
