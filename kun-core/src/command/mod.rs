// ============================================================================
// kun-core/src/command/mod.rs
// ============================================================================
//
// COMMAND BUILDER: Job Specifications to ffmpeg Argument Vectors
//
// Everything here is pure. Given a job, the probed source duration and the
// resolved hardware backend, it produces the exact argument vectors the runner
// hands to the engine. The engine is order-sensitive, so each builder emits
// its options in one fixed sequence and the output path always comes last.
//
// KEY COMPONENTS:
// - transcode_args: direct transcode vector
// - gif_filter_graph / gif_*_args: single-pass and two-stage GIF vectors
// - TrimWindow: the `-ss`/`-t` pair shared by every GIF stage
// - Pipeline: the weighted list of engine runs that make up one job

use std::path::{Path, PathBuf};

use crate::hardware_accel::HwAccelBackend;
use crate::job::{GifJobSpec, GifMode, JobSpec};

mod gif;
mod transcode;

pub use gif::{gif_apply_palette_args, gif_filter_graph, gif_palette_args, gif_single_pass_args};
pub use transcode::transcode_args;

/// Collects an argument vector in order.
#[derive(Debug, Default)]
pub(crate) struct ArgList {
    args: Vec<String>,
}

impl ArgList {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Global options every invocation carries.
    pub(crate) fn with_globals() -> Self {
        let mut list = Self::new();
        list.arg("-y").arg("-hide_banner");
        list
    }

    pub(crate) fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    pub(crate) fn pair(&mut self, flag: &str, value: impl Into<String>) -> &mut Self {
        self.arg(flag).arg(value)
    }

    /// `-hwaccel` must be added before the input it applies to.
    pub(crate) fn hwaccel(&mut self, backend: Option<HwAccelBackend>) -> &mut Self {
        if let Some(backend) = backend {
            self.pair("-hwaccel", backend.as_str());
        }
        self
    }

    pub(crate) fn path(&mut self, path: &Path) -> &mut Self {
        self.arg(path.to_string_lossy())
    }

    pub(crate) fn finish(self) -> Vec<String> {
        self.args
    }
}

/// Builder for comma-joined filter chains.
#[derive(Debug, Default)]
pub(crate) struct VideoFilterChain {
    filters: Vec<String>,
}

impl VideoFilterChain {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub(crate) fn add_filter(mut self, filter: Option<String>) -> Self {
        if let Some(filter) = filter.filter(|f| !f.is_empty()) {
            self.filters.push(filter);
        }
        self
    }

    /// Joins the chain, or `None` when nothing was added.
    #[must_use]
    pub(crate) fn build(self) -> Option<String> {
        if self.filters.is_empty() {
            None
        } else {
            Some(self.filters.join(","))
        }
    }
}

/// Formats seconds and rates without a trailing `.0` (`10.0` -> `"10"`).
#[must_use]
pub fn format_number(value: f64) -> String {
    format!("{value}")
}

/// The `-ss`/`-t` input window of a GIF job.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrimWindow {
    pub start: Option<f64>,
    pub duration: Option<f64>,
}

impl TrimWindow {
    /// Derives the window from the job and the probed source duration.
    ///
    /// A start offset without a duration is turned into an explicit `-t` of
    /// the remaining source length. When the source length is unknown the
    /// window keeps only the start and the engine runs to end of stream.
    #[must_use]
    pub fn for_gif(spec: &GifJobSpec, source_duration: Option<f64>) -> Self {
        let duration = match (spec.start, spec.duration) {
            (_, Some(duration)) => Some(duration),
            (Some(start), None) => source_duration
                .map(|total| total - start)
                .filter(|remaining| *remaining > 0.0),
            (None, None) => None,
        };
        Self {
            start: spec.start,
            duration,
        }
    }

    /// Length of the produced clip, if it can be known.
    #[must_use]
    pub fn output_duration(&self, source_duration: Option<f64>) -> Option<f64> {
        self.duration.or_else(|| {
            source_duration
                .map(|total| total - self.start.unwrap_or(0.0))
                .filter(|d| *d > 0.0)
        })
    }

    pub(crate) fn push_args(&self, args: &mut ArgList) {
        if let Some(start) = self.start {
            args.pair("-ss", format_number(start));
        }
        if let Some(duration) = self.duration {
            args.pair("-t", format_number(duration));
        }
    }
}

/// Inputs to [`plan`] that are not part of the job itself.
#[derive(Debug, Clone)]
pub struct PlanContext {
    /// Probed duration of the source, in seconds
    pub source_duration: Option<f64>,
    /// Backend already resolved against the engine's capabilities
    pub hwaccel: Option<HwAccelBackend>,
    /// Where a two-stage GIF writes its palette image
    pub palette_path: PathBuf,
}

/// One engine run within a job.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineStep {
    pub label: &'static str,
    pub args: Vec<String>,
    /// Share of the job's progress range this step occupies
    pub weight: f64,
    /// Start of this step's progress range
    pub offset: f64,
    /// Duration of the media this step produces, used to normalize its progress
    pub expected_duration: Option<f64>,
}

impl PipelineStep {
    /// Maps the step's own fraction-complete into the job's range.
    #[must_use]
    pub fn remap(&self, raw: f64) -> f64 {
        (self.offset + raw.clamp(0.0, 1.0) * self.weight).min(1.0)
    }
}

/// Ordered engine runs with declared progress weights.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    steps: Vec<PipelineStep>,
}

impl Pipeline {
    /// Builds a pipeline from `(label, weight, args)`; weights are normalized
    /// so the steps cover `[0, 1]` back to back.
    #[must_use]
    pub fn weighted(
        steps: Vec<(&'static str, f64, Vec<String>)>,
        expected_duration: Option<f64>,
    ) -> Self {
        let total: f64 = steps.iter().map(|(_, w, _)| w).sum();
        let mut offset = 0.0;
        let steps = steps
            .into_iter()
            .map(|(label, weight, args)| {
                let weight = if total > 0.0 { weight / total } else { 0.0 };
                let step = PipelineStep {
                    label,
                    args,
                    weight,
                    offset,
                    expected_duration,
                };
                offset += weight;
                step
            })
            .collect();
        Self { steps }
    }

    #[must_use]
    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Length of the media a transcode will produce.
#[must_use]
pub fn transcode_output_duration(
    start: Option<f64>,
    end: Option<f64>,
    source_duration: Option<f64>,
) -> Option<f64> {
    let start = start.unwrap_or(0.0);
    match end {
        Some(end) => {
            let end = source_duration.map_or(end, |total| end.min(total));
            Some(end - start).filter(|d| *d > 0.0)
        }
        None => source_duration.map(|total| total - start).filter(|d| *d > 0.0),
    }
}

/// Turns a job into the engine runs that carry it out.
#[must_use]
pub fn plan(spec: &JobSpec, ctx: &PlanContext) -> Pipeline {
    match spec {
        JobSpec::Transcode(job) => Pipeline::weighted(
            vec![("transcode", 1.0, transcode_args(job, ctx.hwaccel))],
            transcode_output_duration(job.start, job.end, ctx.source_duration),
        ),
        JobSpec::Gif(job) => {
            let window = TrimWindow::for_gif(job, ctx.source_duration);
            let expected = window.output_duration(ctx.source_duration);
            match job.mode {
                GifMode::SinglePass => Pipeline::weighted(
                    vec![("gif", 1.0, gif_single_pass_args(job, &window, ctx.hwaccel))],
                    expected,
                ),
                GifMode::TwoStage => Pipeline::weighted(
                    vec![
                        (
                            "palette",
                            0.5,
                            gif_palette_args(job, &window, ctx.hwaccel, &ctx.palette_path),
                        ),
                        (
                            "gif",
                            0.5,
                            gif_apply_palette_args(job, &window, ctx.hwaccel, &ctx.palette_path),
                        ),
                    ],
                    expected,
                ),
            }
        }
    }
}
