//! Implementation of the 'transcode' subcommand.

use anyhow::{Context, Result};
use kun_core::job::{Container, TranscodeJobSpec, default_transcode_output};
use log::info;
use std::path::Path;
use std::sync::Arc;

use super::{create_runner, job::run_with_progress};
use crate::cli::TranscodeArgs;

/// Builds the job described by the arguments.
pub fn build_transcode_spec(args: &TranscodeArgs) -> Result<TranscodeJobSpec> {
    let output = match &args.output {
        Some(output) => output.clone(),
        None => default_transcode_output(&args.input, args.format.unwrap_or(Container::Mp4)),
    };

    let mut builder = TranscodeJobSpec::builder(&args.input, output).hwaccel(args.hwaccel.clone());
    if let Some(format) = args.format {
        builder = builder.container(format);
    }
    if let Some(codec) = args.video_codec {
        builder = builder.video_codec(codec);
    }
    if let Some(codec) = args.audio_codec {
        builder = builder.audio_codec(codec);
    }
    if let Some(width) = args.width {
        builder = builder.width(width);
    }
    if let Some(height) = args.height {
        builder = builder.height(height);
    }
    if let Some(fps) = args.fps {
        builder = builder.fps(fps);
    }
    if let Some(crf) = args.crf {
        builder = builder.crf(crf);
    }
    if let Some(bitrate) = &args.bitrate {
        builder = builder.bitrate(bitrate.as_str());
    }
    if let Some(preset) = args.preset {
        builder = builder.preset(preset);
    }
    if let Some(start) = args.start {
        builder = builder.start(start);
    }
    if let Some(end) = args.end {
        builder = builder.end(end);
    }
    if let Some(bitrate) = &args.audio_bitrate {
        builder = builder.audio_bitrate(bitrate.as_str());
    }

    builder.build().context("Invalid transcode options")
}

pub fn run_transcode(args: TranscodeArgs, ffmpeg: Option<&Path>) -> Result<()> {
    let spec = build_transcode_spec(&args)?;
    info!(
        "Transcoding {} -> {} ({}, {})",
        spec.input.display(),
        spec.output.display(),
        spec.video_codec,
        spec.audio_codec
    );

    let runner = Arc::new(create_runner(ffmpeg));
    run_with_progress(&runner, &spec.into())
}
