//! Animated GIF job specification.

use std::path::PathBuf;

use super::options::{DitherMode, GifQuality, ScalingAlgorithm};
use super::{check_dimension, check_fps, check_start};
use crate::error::{CoreError, CoreResult};
use crate::hardware_accel::HwAccelChoice;

/// How the palette is produced and applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GifMode {
    /// One engine run; `palettegen` and `paletteuse` share one filter graph.
    #[default]
    SinglePass,
    /// Palette image first, then a second run that applies it.
    TwoStage,
}

/// An immutable, validated description of one GIF conversion.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct GifJobSpec {
    pub input: PathBuf,
    pub output: PathBuf,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f64>,
    /// Seconds into the source where the clip starts
    pub start: Option<f64>,
    /// Clip length in seconds; `None` runs to the end of the source
    pub duration: Option<f64>,
    pub quality: GifQuality,
    pub mode: GifMode,
    pub hwaccel_enabled: bool,
    pub hwaccel: HwAccelChoice,
    pub scaling: ScalingAlgorithm,
    /// Explicit dither; the quality tier's default applies when unset
    pub dither: Option<DitherMode>,
}

impl GifJobSpec {
    #[must_use]
    pub fn builder(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> GifJobBuilder {
        GifJobBuilder::new(input.into(), output.into())
    }

    /// Dither mode that `paletteuse` receives.
    #[must_use]
    pub fn effective_dither(&self) -> DitherMode {
        self.dither.unwrap_or_else(|| self.quality.default_dither())
    }

    /// Hardware acceleration request after the enable flag is applied.
    #[must_use]
    pub fn hwaccel_request(&self) -> HwAccelChoice {
        if self.hwaccel_enabled {
            self.hwaccel.clone()
        } else {
            HwAccelChoice::Disabled
        }
    }
}

/// Builder for [`GifJobSpec`].
#[derive(Debug, Clone)]
pub struct GifJobBuilder {
    spec: GifJobSpec,
}

impl GifJobBuilder {
    fn new(input: PathBuf, output: PathBuf) -> Self {
        Self {
            spec: GifJobSpec {
                input,
                output,
                width: None,
                height: None,
                fps: None,
                start: None,
                duration: None,
                quality: GifQuality::default(),
                mode: GifMode::default(),
                hwaccel_enabled: false,
                hwaccel: HwAccelChoice::Auto,
                scaling: ScalingAlgorithm::default(),
                dither: None,
            },
        }
    }

    #[must_use]
    pub fn width(mut self, width: u32) -> Self {
        self.spec.width = Some(width);
        self
    }

    #[must_use]
    pub fn height(mut self, height: u32) -> Self {
        self.spec.height = Some(height);
        self
    }

    #[must_use]
    pub fn fps(mut self, fps: f64) -> Self {
        self.spec.fps = Some(fps);
        self
    }

    #[must_use]
    pub fn start(mut self, seconds: f64) -> Self {
        self.spec.start = Some(seconds);
        self
    }

    #[must_use]
    pub fn duration(mut self, seconds: f64) -> Self {
        self.spec.duration = Some(seconds);
        self
    }

    #[must_use]
    pub fn quality(mut self, quality: GifQuality) -> Self {
        self.spec.quality = quality;
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: GifMode) -> Self {
        self.spec.mode = mode;
        self
    }

    /// Enables hardware decoding with the given backend selector.
    #[must_use]
    pub fn hwaccel(mut self, choice: HwAccelChoice) -> Self {
        self.spec.hwaccel_enabled = true;
        self.spec.hwaccel = choice;
        self
    }

    #[must_use]
    pub fn scaling(mut self, scaling: ScalingAlgorithm) -> Self {
        self.spec.scaling = scaling;
        self
    }

    #[must_use]
    pub fn dither(mut self, dither: DitherMode) -> Self {
        self.spec.dither = Some(dither);
        self
    }

    pub fn build(self) -> CoreResult<GifJobSpec> {
        let spec = self.spec;
        check_dimension("width", spec.width)?;
        check_dimension("height", spec.height)?;
        check_fps(spec.fps)?;
        check_start(spec.start)?;
        if let Some(duration) = spec.duration {
            if !duration.is_finite() || duration <= 0.0 {
                return Err(CoreError::InvalidJob(format!(
                    "Duration must be positive, got {duration}"
                )));
            }
        }
        Ok(spec)
    }
}
