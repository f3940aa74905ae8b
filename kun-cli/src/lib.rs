// kun-cli/src/lib.rs
//
// Library portion of the Kun CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod output;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands, GifArgs, ProbeArgs, TranscodeArgs};
pub use commands::{run_gif, run_hwaccels, run_probe, run_transcode};
