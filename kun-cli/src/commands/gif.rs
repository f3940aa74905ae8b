//! Implementation of the 'gif' subcommand.

use anyhow::{Context, Result};
use kun_core::job::{GifJobSpec, GifMode, default_gif_output};
use log::info;
use std::path::Path;
use std::sync::Arc;

use super::{create_runner, job::run_with_progress};
use crate::cli::GifArgs;

pub fn build_gif_spec(args: &GifArgs) -> Result<GifJobSpec> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_gif_output(&args.input));
    let mode = if args.two_stage {
        GifMode::TwoStage
    } else {
        GifMode::SinglePass
    };

    let mut builder = GifJobSpec::builder(&args.input, output)
        .fps(args.fps)
        .quality(args.quality)
        .mode(mode)
        .hwaccel(args.hwaccel.clone())
        .scaling(args.scaling);
    if let Some(width) = args.width {
        builder = builder.width(width);
    }
    if let Some(height) = args.height {
        builder = builder.height(height);
    }
    if let Some(start) = args.start {
        builder = builder.start(start);
    }
    if let Some(duration) = args.duration {
        builder = builder.duration(duration);
    }
    if let Some(dither) = args.dither {
        builder = builder.dither(dither);
    }

    builder.build().context("Invalid GIF options")
}

pub fn run_gif(args: GifArgs, ffmpeg: Option<&Path>) -> Result<()> {
    let spec = build_gif_spec(&args)?;
    info!(
        "Creating GIF {} -> {} ({} quality, {:?})",
        spec.input.display(),
        spec.output.display(),
        spec.quality,
        spec.mode
    );

    let runner = Arc::new(create_runner(ffmpeg));
    run_with_progress(&runner, &spec.into())
}
