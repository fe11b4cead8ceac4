// scenecut-cli/src/main.rs
//
// Entry point for the scenecut binary.
//
// Responsibilities include:
// - Parsing command-line arguments.
// - Setting up logging.
// - Dispatching to the split, refine and threshold commands.
// - Reporting errors and managing the process exit code.

use clap::Parser;
use owo_colors::OwoColorize;
use scenecut_cli::logging::init_logging;
use scenecut_cli::{Cli, Commands, run_refine, run_split, run_threshold};
use std::process;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Split(args) => run_split(args),
        Commands::Refine(args) => run_refine(args),
        Commands::Threshold(args) => run_threshold(args),
    };

    if let Err(e) = result {
        log::debug!("Command failed: {:?}", e);
        eprintln!("{} {:#}", "Error:".bright_red().bold(), e);
        process::exit(1);
    }
}
