//! Direct transcode job specification.

use std::path::{Path, PathBuf};

use super::options::{AudioCodec, Container, Preset, VideoCodec};
use super::{check_dimension, check_fps, check_start};
use crate::error::{CoreError, CoreResult};
use crate::hardware_accel::HwAccelChoice;

/// Highest CRF accepted by the x264/x265 family.
pub const MAX_CRF: u8 = 51;

/// Video rate control: constant quality or a target bitrate, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoQuality {
    /// `-crf N`
    Crf(u8),
    /// `-b:v TOKEN`, e.g. `"2M"`
    Bitrate(String),
}

/// An immutable, validated description of one transcode.
///
/// Built with [`TranscodeJobSpec::builder`]; construction fails when CRF and
/// bitrate are both requested, when the trim window is empty, or when a
/// dimension or frame rate is not positive.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct TranscodeJobSpec {
    pub input: PathBuf,
    pub output: PathBuf,
    pub container: Container,
    pub video_codec: VideoCodec,
    pub audio_codec: AudioCodec,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f64>,
    pub quality: Option<VideoQuality>,
    pub preset: Option<Preset>,
    /// Trim start in seconds
    pub start: Option<f64>,
    /// Trim end in seconds, always greater than `start`
    pub end: Option<f64>,
    pub hwaccel: HwAccelChoice,
    pub audio_bitrate: Option<String>,
}

impl TranscodeJobSpec {
    /// Starts a builder. The container defaults to the output's extension
    /// when it names a supported one, otherwise MP4.
    #[must_use]
    pub fn builder(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> TranscodeJobBuilder {
        TranscodeJobBuilder::new(input.into(), output.into())
    }

    /// CRF value, if the job uses constant quality.
    #[must_use]
    pub fn crf(&self) -> Option<u8> {
        match self.quality {
            Some(VideoQuality::Crf(crf)) => Some(crf),
            _ => None,
        }
    }

    /// Target bitrate token, if the job uses bitrate control.
    #[must_use]
    pub fn bitrate(&self) -> Option<&str> {
        match &self.quality {
            Some(VideoQuality::Bitrate(b)) => Some(b),
            _ => None,
        }
    }
}

/// Builder for [`TranscodeJobSpec`].
#[derive(Debug, Clone)]
pub struct TranscodeJobBuilder {
    input: PathBuf,
    output: PathBuf,
    container: Option<Container>,
    video_codec: VideoCodec,
    audio_codec: AudioCodec,
    width: Option<u32>,
    height: Option<u32>,
    fps: Option<f64>,
    crf: Option<u8>,
    bitrate: Option<String>,
    preset: Option<Preset>,
    start: Option<f64>,
    end: Option<f64>,
    hwaccel: HwAccelChoice,
    audio_bitrate: Option<String>,
}

impl TranscodeJobBuilder {
    fn new(input: PathBuf, output: PathBuf) -> Self {
        Self {
            input,
            output,
            container: None,
            video_codec: VideoCodec::X264,
            audio_codec: AudioCodec::Aac,
            width: None,
            height: None,
            fps: None,
            crf: None,
            bitrate: None,
            preset: None,
            start: None,
            end: None,
            hwaccel: HwAccelChoice::Disabled,
            audio_bitrate: None,
        }
    }

    #[must_use]
    pub fn container(mut self, container: Container) -> Self {
        self.container = Some(container);
        self
    }

    #[must_use]
    pub fn video_codec(mut self, codec: VideoCodec) -> Self {
        self.video_codec = codec;
        self
    }

    #[must_use]
    pub fn audio_codec(mut self, codec: AudioCodec) -> Self {
        self.audio_codec = codec;
        self
    }

    #[must_use]
    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    #[must_use]
    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    #[must_use]
    pub fn fps(mut self, fps: f64) -> Self {
        self.fps = Some(fps);
        self
    }

    #[must_use]
    pub fn crf(mut self, crf: u8) -> Self {
        self.crf = Some(crf);
        self
    }

    #[must_use]
    pub fn bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.bitrate = Some(bitrate.into());
        self
    }

    #[must_use]
    pub fn preset(mut self, preset: Preset) -> Self {
        self.preset = Some(preset);
        self
    }

    #[must_use]
    pub fn start(mut self, seconds: f64) -> Self {
        self.start = Some(seconds);
        self
    }

    #[must_use]
    pub fn end(mut self, seconds: f64) -> Self {
        self.end = Some(seconds);
        self
    }

    #[must_use]
    pub fn hwaccel(mut self, choice: HwAccelChoice) -> Self {
        self.hwaccel = choice;
        self
    }

    #[must_use]
    pub fn audio_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.audio_bitrate = Some(bitrate.into());
        self
    }

    /// Validates the options and produces the spec.
    pub fn build(self) -> CoreResult<TranscodeJobSpec> {
        let quality = match (self.crf, self.bitrate) {
            (Some(_), Some(_)) => {
                return Err(CoreError::InvalidJob(
                    "CRF and bitrate are mutually exclusive".to_string(),
                ));
            }
            (Some(crf), None) if crf > MAX_CRF => {
                return Err(CoreError::InvalidJob(format!(
                    "CRF must be between 0 and {MAX_CRF}, got {crf}"
                )));
            }
            (Some(crf), None) => Some(VideoQuality::Crf(crf)),
            (None, Some(bitrate)) => {
                let bitrate = bitrate.trim().to_string();
                if bitrate.is_empty() {
                    return Err(CoreError::InvalidJob("Bitrate must not be empty".to_string()));
                }
                Some(VideoQuality::Bitrate(bitrate))
            }
            (None, None) => None,
        };

        check_dimension("width", self.width)?;
        check_dimension("height", self.height)?;
        check_fps(self.fps)?;
        check_start(self.start)?;
        if let Some(end) = self.end {
            let start = self.start.unwrap_or(0.0);
            if !end.is_finite() || end <= start {
                return Err(CoreError::InvalidJob(format!(
                    "End time ({end}s) must be after start time ({start}s)"
                )));
            }
        }

        let container = self
            .container
            .or_else(|| container_from_extension(&self.output))
            .unwrap_or(Container::Mp4);

        Ok(TranscodeJobSpec {
            input: self.input,
            output: self.output,
            container,
            video_codec: self.video_codec,
            audio_codec: self.audio_codec,
            width: self.width,
            height: self.height,
            fps: self.fps,
            quality,
            preset: self.preset,
            start: self.start,
            end: self.end,
            hwaccel: self.hwaccel,
            audio_bitrate: self
                .audio_bitrate
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty()),
        })
    }
}

fn container_from_extension(path: &Path) -> Option<Container> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| ext.parse().ok())
}
