// ============================================================================
// kun-cli/src/main.rs
// ============================================================================
//
// KUN CLI: Entry Point
//
// Parses arguments, installs the logger, dispatches to the subcommand and
// maps the result onto the process exit code (0 on success, 1 on failure).

use clap::Parser;
use kun_cli::logging::init_logging;
use kun_cli::output::print_error;
use kun_cli::{Cli, Commands, run_gif, run_hwaccels, run_probe, run_transcode};
use std::process;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ffmpeg = cli.ffmpeg.as_deref();
    let result = match cli.command {
        Commands::Transcode(args) => run_transcode(args, ffmpeg),
        Commands::Gif(args) => run_gif(args, ffmpeg),
        Commands::Probe(args) => run_probe(args, ffmpeg),
        Commands::Hwaccels => run_hwaccels(ffmpeg),
    };

    if let Err(e) = result {
        log::debug!("Command failed: {:?}", e);
        print_error(&format!("{e:#}"));
        process::exit(1);
    }
}
