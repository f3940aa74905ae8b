// kun-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Parser, Subcommand};
use kun_core::HwAccelChoice;
use kun_core::job::{
    AudioCodec, Container, DitherMode, GifQuality, Preset, ScalingAlgorithm, VideoCodec,
};
use std::convert::Infallible;
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Kun: ffmpeg transcode job runner",
    long_about = "Converts videos and builds GIFs by driving an external ffmpeg through kun-core."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the ffmpeg executable (searched for when omitted)
    #[arg(long, global = true, value_name = "PATH", env = "KUN_FFMPEG")]
    pub ffmpeg: Option<PathBuf>,

    /// Show debug logs and raw ffmpeg output
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Converts a video to another container and/or codec
    Transcode(TranscodeArgs),
    /// Builds an animated GIF from a video
    Gif(GifArgs),
    /// Prints the properties of a media file
    Probe(ProbeArgs),
    /// Lists the hardware acceleration backends ffmpeg supports
    Hwaccels,
}

fn hwaccel_choice(value: &str) -> Result<HwAccelChoice, Infallible> {
    Ok(HwAccelChoice::from_name(value))
}

fn gif_quality(value: &str) -> Result<GifQuality, Infallible> {
    Ok(GifQuality::from_name(value))
}

#[derive(Parser, Debug)]
pub struct TranscodeArgs {
    /// Source video file
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file (defaults to INPUT_encoded.<format> next to the input)
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Output container: mp4, avi, mov, mkv, webm, wmv, flv, mpg, m4v
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<Container>,

    /// Video encoder: libx264, libx265, libvpx, libvpx-vp9, mpeg4, copy
    #[arg(long, value_name = "CODEC")]
    pub video_codec: Option<VideoCodec>,

    /// Audio encoder: aac, mp3, libmp3lame, libvorbis, libopus, copy
    #[arg(long, value_name = "CODEC")]
    pub audio_codec: Option<AudioCodec>,

    #[arg(long, value_name = "PIXELS")]
    pub width: Option<u32>,

    #[arg(long, value_name = "PIXELS")]
    pub height: Option<u32>,

    /// Output frame rate
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f64>,

    /// Constant rate factor (0-51, lower is better quality)
    #[arg(long, value_name = "CRF", conflicts_with = "bitrate",
          value_parser = clap::value_parser!(u8).range(0..=51))]
    pub crf: Option<u8>,

    /// Target video bitrate, e.g. 2M or 800k
    #[arg(long, value_name = "RATE")]
    pub bitrate: Option<String>,

    /// Encoder preset (libx264/libx265 only)
    #[arg(long, value_name = "PRESET")]
    pub preset: Option<Preset>,

    /// Start offset in seconds
    #[arg(long, value_name = "SECONDS")]
    pub start: Option<f64>,

    /// End position in seconds
    #[arg(long, value_name = "SECONDS")]
    pub end: Option<f64>,

    /// Hardware decoding: none, auto, or a backend name
    #[arg(long, value_name = "BACKEND", default_value = "none", value_parser = hwaccel_choice)]
    pub hwaccel: HwAccelChoice,

    /// Audio bitrate, e.g. 192k (overrides the encoder default)
    #[arg(long, value_name = "RATE")]
    pub audio_bitrate: Option<String>,
}

#[derive(Parser, Debug)]
pub struct GifArgs {
    /// Source video file
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output GIF (defaults to INPUT.gif next to the input)
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    #[arg(long, value_name = "PIXELS")]
    pub width: Option<u32>,

    #[arg(long, value_name = "PIXELS")]
    pub height: Option<u32>,

    #[arg(long, value_name = "FPS", default_value_t = 15.0)]
    pub fps: f64,

    /// Start offset in seconds
    #[arg(long, value_name = "SECONDS")]
    pub start: Option<f64>,

    /// Clip length in seconds
    #[arg(long, value_name = "SECONDS")]
    pub duration: Option<f64>,

    /// Palette quality: low, medium, high
    #[arg(long, value_name = "TIER", default_value = "medium", value_parser = gif_quality)]
    pub quality: GifQuality,

    /// Generate the palette in a separate ffmpeg run
    #[arg(long, default_value_t = false)]
    pub two_stage: bool,

    /// Hardware decoding: none, auto, or a backend name
    #[arg(long, value_name = "BACKEND", default_value = "none", value_parser = hwaccel_choice)]
    pub hwaccel: HwAccelChoice,

    /// Scaling algorithm: lanczos, bicubic, bilinear, neighbor
    #[arg(long, value_name = "ALGORITHM", default_value = "lanczos")]
    pub scaling: ScalingAlgorithm,

    /// Dither mode (defaults to the quality tier's choice)
    #[arg(long, value_name = "MODE")]
    pub dither: Option<DitherMode>,
}

#[derive(Parser, Debug)]
pub struct ProbeArgs {
    /// Media file to inspect
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Print the result as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
