// ============================================================================
// kun-core/src/probe.rs
// ============================================================================
//
// MEDIA PROBER: Source Metadata for Progress and Trim Computation
//
// `probe` prefers ffprobe's JSON report when an ffprobe sits next to the
// located ffmpeg, and otherwise scrapes the stream summary ffmpeg prints for
// `-i <file>`. Any failure (missing file, no engine, timeout, bad output)
// yields `None`; callers treat that as "duration unknown".
//
// KEY COMPONENTS:
// - MediaInfo: the metadata the rest of the crate consumes
// - MediaProbe: trait seam used by the job runner
// - MediaProber: the ffprobe/ffmpeg implementation
// - parse_ffprobe_json / parse_ffmpeg_banner: pure parsers

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, LazyLock, OnceLock};
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::CoreConfig;
use crate::engine::{EngineLocator, check_dependency, ffprobe_path_for};
use crate::error::{CoreError, CoreResult};
use crate::utils::run_with_timeout;

/// Metadata of a media file. Every field is optional; probes report what
/// they can.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f64>,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    /// Demuxer name, e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`
    pub container: Option<String>,
    /// Overall bitrate in bits per second
    pub bitrate: Option<u64>,
    /// File size in bytes
    pub file_size: Option<u64>,
}

/// Source of media metadata.
pub trait MediaProbe: Send + Sync {
    fn probe(&self, path: &Path) -> Option<MediaInfo>;
}

// ---- ffprobe JSON ----

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    duration: Option<String>,
    bit_rate: Option<String>,
    size: Option<String>,
}

/// Parses ffprobe's `num/den` rate notation; `0/0` is treated as unknown.
fn parse_rate(rate: &str) -> Option<f64> {
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num.trim().parse::<f64>().ok()? / den
        }
        None => rate.trim().parse().ok()?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

fn parse_positive(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
}

/// Parses the output of `ffprobe -print_format json -show_format -show_streams`.
pub fn parse_ffprobe_json(json: &str) -> CoreResult<MediaInfo> {
    let output: FfprobeOutput = serde_json::from_str(json)?;
    let video = output
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));
    let audio = output
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"));
    let format = output.format.as_ref();

    let info = MediaInfo {
        duration: parse_positive(format.and_then(|f| f.duration.as_deref()))
            .or_else(|| parse_positive(video.and_then(|v| v.duration.as_deref()))),
        width: video.and_then(|v| v.width),
        height: video.and_then(|v| v.height),
        fps: video.and_then(|v| {
            v.avg_frame_rate
                .as_deref()
                .and_then(parse_rate)
                .or_else(|| v.r_frame_rate.as_deref().and_then(parse_rate))
        }),
        video_codec: video.and_then(|v| v.codec_name.clone()),
        audio_codec: audio.and_then(|a| a.codec_name.clone()),
        container: format.and_then(|f| f.format_name.clone()),
        bitrate: format
            .and_then(|f| f.bit_rate.as_deref())
            .and_then(|b| b.trim().parse().ok()),
        file_size: format
            .and_then(|f| f.size.as_deref())
            .and_then(|s| s.trim().parse().ok()),
    };

    if info.duration.is_none() && video.is_none() && audio.is_none() {
        return Err(CoreError::Probe("ffprobe reported no streams".to_string()));
    }
    Ok(info)
}

// ---- ffmpeg banner fallback ----

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Duration:\s*(\d{2,}):(\d{2}):(\d{2}(?:\.\d+)?)").expect("valid duration regex")
});
static BITRATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"bitrate:\s*(\d+)\s*kb/s").expect("valid bitrate regex"));
static INPUT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Input #0, (.+?), from").expect("valid input regex"));
static VIDEO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Stream #\S+.*?: Video: (\w+)").expect("valid video regex"));
static AUDIO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Stream #\S+.*?: Audio: (\w+)").expect("valid audio regex"));
static SIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{2,5})x(\d{2,5})\b").expect("valid size regex"));
static FPS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?) fps").expect("valid fps regex"));

/// Parses the stream summary ffmpeg prints to stderr for `-i <file>`.
pub fn parse_ffmpeg_banner(stderr: &str) -> CoreResult<MediaInfo> {
    let mut info = MediaInfo::default();

    if let Some(caps) = DURATION_RE.captures(stderr) {
        let h: f64 = caps[1].parse().unwrap_or(0.0);
        let m: f64 = caps[2].parse().unwrap_or(0.0);
        let s: f64 = caps[3].parse().unwrap_or(0.0);
        info.duration = Some(h * 3600.0 + m * 60.0 + s).filter(|d| *d > 0.0);
    }
    info.bitrate = BITRATE_RE
        .captures(stderr)
        .and_then(|c| c[1].parse::<u64>().ok())
        .map(|kbps| kbps * 1000);
    info.container = INPUT_RE.captures(stderr).map(|c| c[1].to_string());
    info.audio_codec = AUDIO_RE.captures(stderr).map(|c| c[1].to_string());

    if let Some(line) = stderr.lines().find(|l| VIDEO_RE.is_match(l)) {
        info.video_codec = VIDEO_RE.captures(line).map(|c| c[1].to_string());
        if let Some(size) = SIZE_RE.captures(line) {
            info.width = size[1].parse().ok();
            info.height = size[2].parse().ok();
        }
        info.fps = FPS_RE
            .captures(line)
            .and_then(|c| c[1].parse().ok())
            .filter(|f: &f64| *f > 0.0);
    }

    if info.duration.is_none() && info.video_codec.is_none() && info.audio_codec.is_none() {
        return Err(CoreError::Probe("no media information in ffmpeg output".to_string()));
    }
    Ok(info)
}

// ---- Prober ----

/// Probes files with the engine found by an [`EngineLocator`].
pub struct MediaProber {
    locator: Arc<dyn EngineLocator>,
    timeout: Duration,
    version_timeout: Duration,
    ffprobe: OnceLock<Option<PathBuf>>,
}

impl MediaProber {
    #[must_use]
    pub fn new(locator: Arc<dyn EngineLocator>, config: &CoreConfig) -> Self {
        Self {
            locator,
            timeout: config.probe_timeout,
            version_timeout: config.version_check_timeout,
            ffprobe: OnceLock::new(),
        }
    }

    fn ffprobe(&self, engine: &Path) -> Option<PathBuf> {
        self.ffprobe
            .get_or_init(|| {
                ffprobe_path_for(engine)
                    .filter(|probe| check_dependency(probe, self.version_timeout).is_ok())
            })
            .clone()
    }

    fn probe_with_ffprobe(&self, ffprobe: &Path, path: &Path) -> CoreResult<MediaInfo> {
        let output = run_with_timeout(
            Command::new(ffprobe)
                .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
                .arg(path),
            self.timeout,
        )?;
        if !output.status.success() {
            return Err(crate::error::command_failed_error(
                "ffprobe",
                output.status,
                output.stderr,
            ));
        }
        parse_ffprobe_json(&output.stdout)
    }

    fn probe_with_ffmpeg(&self, engine: &Path, path: &Path) -> CoreResult<MediaInfo> {
        // Exits non-zero because no output is given; only stderr matters.
        let output = run_with_timeout(
            Command::new(engine).arg("-hide_banner").arg("-i").arg(path),
            self.timeout,
        )?;
        parse_ffmpeg_banner(&output.stderr)
    }

    fn try_probe(&self, path: &Path) -> CoreResult<MediaInfo> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(CoreError::Probe(format!("{} is not a file", path.display())));
        }
        let engine = self.locator.locate().ok_or(CoreError::EngineNotFound)?;

        let mut info = match self.ffprobe(&engine) {
            Some(ffprobe) => self.probe_with_ffprobe(&ffprobe, path)?,
            None => {
                log::debug!("ffprobe unavailable, probing with ffmpeg");
                self.probe_with_ffmpeg(&engine, path)?
            }
        };
        info.file_size = info.file_size.or(Some(metadata.len()));
        Ok(info)
    }
}

impl MediaProbe for MediaProber {
    fn probe(&self, path: &Path) -> Option<MediaInfo> {
        match self.try_probe(path) {
            Ok(info) => {
                log::debug!("Probed {}: {:?}", path.display(), info);
                Some(info)
            }
            Err(e) => {
                log::warn!("Could not probe {}: {}", path.display(), e);
                None
            }
        }
    }
}
