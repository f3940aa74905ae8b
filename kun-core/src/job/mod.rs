// ============================================================================
// kun-core/src/job/mod.rs
// ============================================================================
//
// JOB SPECIFICATIONS: What the Caller Asks the Engine to Do
//
// A job is an immutable value object built through a validating builder. Specs
// carry no process state; the runner consumes them by reference and they are
// dropped once the job ends.
//
// KEY COMPONENTS:
// - TranscodeJobSpec: direct container/codec conversion
// - GifJobSpec: palette-based animated GIF generation
// - JobSpec: either of the above, as accepted by the job runner
// - options: closed enums for every engine option a job can name

use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::hardware_accel::HwAccelChoice;

pub mod gif;
pub mod options;
pub mod transcode;

pub use gif::{GifJobBuilder, GifJobSpec, GifMode};
pub use options::{
    AudioCodec, AudioQuality, Container, DitherMode, GifQuality, Preset, ScalingAlgorithm,
    VideoCodec,
};
pub use transcode::{MAX_CRF, TranscodeJobBuilder, TranscodeJobSpec, VideoQuality};

/// Kind of job, used in status and log messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Transcode,
    Gif,
}

impl JobKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            JobKind::Transcode => "transcode",
            JobKind::Gif => "GIF conversion",
        }
    }
}

/// A job accepted by [`crate::JobRunner::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum JobSpec {
    Transcode(TranscodeJobSpec),
    Gif(GifJobSpec),
}

impl JobSpec {
    #[must_use]
    pub fn kind(&self) -> JobKind {
        match self {
            JobSpec::Transcode(_) => JobKind::Transcode,
            JobSpec::Gif(_) => JobKind::Gif,
        }
    }

    #[must_use]
    pub fn input(&self) -> &Path {
        match self {
            JobSpec::Transcode(spec) => &spec.input,
            JobSpec::Gif(spec) => &spec.input,
        }
    }

    #[must_use]
    pub fn output(&self) -> &Path {
        match self {
            JobSpec::Transcode(spec) => &spec.output,
            JobSpec::Gif(spec) => &spec.output,
        }
    }

    /// Hardware acceleration request, with GIF's enable flag applied.
    #[must_use]
    pub fn hwaccel_request(&self) -> HwAccelChoice {
        match self {
            JobSpec::Transcode(spec) => spec.hwaccel.clone(),
            JobSpec::Gif(spec) => spec.hwaccel_request(),
        }
    }
}

impl From<TranscodeJobSpec> for JobSpec {
    fn from(spec: TranscodeJobSpec) -> Self {
        JobSpec::Transcode(spec)
    }
}

impl From<GifJobSpec> for JobSpec {
    fn from(spec: GifJobSpec) -> Self {
        JobSpec::Gif(spec)
    }
}

/// `<dir>/<stem>_encoded.<container>` beside the input.
#[must_use]
pub fn default_transcode_output(input: &Path, container: Container) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{stem}_encoded.{}", container.as_str()))
}

/// `<dir>/<stem>.gif` beside the input.
#[must_use]
pub fn default_gif_output(input: &Path) -> PathBuf {
    input.with_extension("gif")
}

pub(crate) fn check_dimension(name: &str, value: Option<u32>) -> CoreResult<()> {
    match value {
        Some(0) => Err(CoreError::InvalidJob(format!("{name} must be positive"))),
        _ => Ok(()),
    }
}

pub(crate) fn check_fps(fps: Option<f64>) -> CoreResult<()> {
    match fps {
        Some(fps) if !fps.is_finite() || fps <= 0.0 => Err(CoreError::InvalidJob(format!(
            "Frame rate must be positive, got {fps}"
        ))),
        _ => Ok(()),
    }
}

pub(crate) fn check_start(start: Option<f64>) -> CoreResult<()> {
    match start {
        Some(start) if !start.is_finite() || start < 0.0 => Err(CoreError::InvalidJob(format!(
            "Start time must not be negative, got {start}"
        ))),
        _ => Ok(()),
    }
}
