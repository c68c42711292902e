use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

mod commands;
mod config;
mod logger;

/// Build and flash AVR firmware for Arduino boards.
///
/// Compiles the project's sources and the configured libraries, archives
/// the libraries into a core archive, links, converts the image to Intel
/// HEX and uploads it through the board's bootloader. Only stale steps run.
///
/// EXAMPLES:
///     embed hex                      Build build/main.hex
///     embed install --port /dev/ttyACM0
///     embed --board micro hex        Build for an Arduino Micro
///     embed clean                    Remove the build directory
///     embed targets                  List targets
///
/// ENVIRONMENT VARIABLES:
///     PORT                  Serial port of the board (default /dev/cuaU1)
///     EMBED_BOARD           Board identifier (uno, micro)
///     EMBED_TOOLCHAIN_ROOT  Arduino distribution root
///     EMBED_JSON            Set to '1' for JSON output by default
///     NO_COLOR              Set to disable colored output
#[derive(Parser)]
#[command(name = "embed")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Project directory (defaults to current directory)
    #[arg(long, short = 'C', global = true)]
    project_dir: Option<PathBuf>,
    /// Board identifier (uno, micro)
    #[arg(long, short = 'b', global = true)]
    board: Option<String>,
    /// Serial port the board is attached to
    #[arg(long, short = 'p', global = true)]
    port: Option<String>,
    /// Arduino distribution root
    #[arg(long, global = true)]
    toolchain_root: Option<PathBuf>,
    /// Verbose output (up-to-date checks, library resolution)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
    /// Quiet output (errors only)
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
    /// JSON output
    #[arg(long, env = "EMBED_JSON", global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the hex file
    ///
    /// Brings build/main.hex up to date: compiles stale sources, refreshes
    /// the core archive, relinks and converts the image.
    Hex,

    /// Install program on USB board
    ///
    /// Builds the hex file if needed, then uploads it with avrdude using
    /// the board's programmer and baud rate.
    ///
    /// EXAMPLES:
    ///     embed install --port /dev/ttyACM0
    ///     PORT=/dev/ttyUSB0 embed install
    Install,

    /// Remove build directory
    Clean,

    /// List targets with their descriptions
    Targets,

    /// Generate shell completions
    ///
    /// EXAMPLES:
    ///     embed completions bash > ~/.bash_completions/embed.bash
    ///     embed completions zsh > ~/.zfunc/_embed
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let global = cli.global;
    logger::init(logger::level(global.verbose, global.quiet))?;

    let args = config::ProjectArgs {
        project_dir: global.project_dir,
        board: global.board,
        port: global.port,
        toolchain_root: global.toolchain_root,
    };

    match cli.command {
        Commands::Hex => commands::hex::run(&args, global.json)?,
        Commands::Install => commands::install::run(&args, global.json)?,
        Commands::Clean => commands::clean::run(&args, global.json)?,
        Commands::Targets => commands::targets::run(&args, global.json)?,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
    }

    Ok(())
}
