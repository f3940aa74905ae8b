//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

pub mod gif;
pub mod hwaccels;
mod job;
pub mod probe;
pub mod transcode;

use kun_core::{CoreConfig, CoreConfigBuilder, JobRunner};
use std::path::Path;

/// Core configuration for one CLI invocation.
pub fn core_config(ffmpeg: Option<&Path>) -> CoreConfig {
    let builder = CoreConfigBuilder::new();
    match ffmpeg {
        Some(path) => builder.engine_path(path),
        None => builder,
    }
    .build()
}

/// Runner backed by the system ffmpeg, or the one passed with `--ffmpeg`.
pub fn create_runner(ffmpeg: Option<&Path>) -> JobRunner {
    JobRunner::new(core_config(ffmpeg))
}

pub use gif::run_gif;
pub use hwaccels::run_hwaccels;
pub use probe::run_probe;
pub use transcode::run_transcode;
