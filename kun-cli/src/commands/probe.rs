//! Implementation of the 'probe' subcommand.

use anyhow::{Context, Result, bail};
use kun_core::{EngineLocator, MediaInfo, format_bytes, format_duration};
use std::path::Path;

use super::create_runner;
use crate::cli::ProbeArgs;
use crate::output::{print_heading, print_info};

pub fn run_probe(args: ProbeArgs, ffmpeg: Option<&Path>) -> Result<()> {
    let runner = create_runner(ffmpeg);
    if runner.locator().locate().is_none() {
        bail!("FFmpeg is not available");
    }
    let Some(info) = runner.probe(&args.input) else {
        bail!("Could not read media information from {}", args.input.display());
    };

    if args.json {
        let json = serde_json::to_string_pretty(&info).context("Failed to serialize probe result")?;
        println!("{json}");
    } else {
        print_media_info(&args.input, &info);
    }
    Ok(())
}

fn or_unknown<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "unknown".to_string(), |v| v.to_string())
}

fn print_media_info(path: &Path, info: &MediaInfo) {
    print_heading(&path.display().to_string());
    print_info("Duration", or_unknown(info.duration.map(format_duration)));
    let resolution = match (info.width, info.height) {
        (Some(w), Some(h)) => Some(format!("{w}x{h}")),
        _ => None,
    };
    print_info("Resolution", or_unknown(resolution));
    print_info("Frame rate", or_unknown(info.fps.map(|fps| format!("{fps:.2} fps"))));
    print_info("Video", or_unknown(info.video_codec.as_deref()));
    print_info("Audio", or_unknown(info.audio_codec.as_deref()));
    print_info("Container", or_unknown(info.container.as_deref()));
    print_info(
        "Bitrate",
        or_unknown(info.bitrate.map(|bps| format!("{} kb/s", bps / 1000))),
    );
    print_info("Size", or_unknown(info.file_size.map(format_bytes)));
}
