//! Stderr logger
//!
//! Routes `log` records from the build library to stderr so that stdout
//! stays clean for `--json` output. Command lines arrive at `info`,
//! scheduling decisions at `debug`.

use colored::Colorize;
use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};

/// Global logger instance
static LOGGER: StderrLogger = StderrLogger;

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = record.args().to_string();
        match record.level() {
            Level::Error => eprintln!("{} {}", "error:".red().bold(), message),
            Level::Warn => eprintln!("{} {}", "warning:".yellow().bold(), message),
            Level::Info => eprintln!("{}", message),
            Level::Debug | Level::Trace => eprintln!("{}", message.dimmed()),
        }
    }

    fn flush(&self) {}
}

/// Level selected by the `-q` / `-v` flags
pub fn level(verbose: bool, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Install the logger
pub fn init(max_level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(max_level);
    Ok(())
}
