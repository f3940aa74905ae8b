//! Progress parsing for ffmpeg diagnostic output.
//!
//! ffmpeg reports progress on stderr as free text with `key=value` tokens:
//!
//! ```text
//! frame=  240 fps= 60 q=28.0 size=    1024kB time=00:00:08.00 bitrate=1048.6kbits/s speed=2.01x
//! ```
//!
//! Only `time=`, `fps=`, `bitrate=` and `speed=` are consumed. The format is
//! not a stable interface of the engine; a line that no longer matches simply
//! yields no sample, so a format change degrades progress display without
//! failing the job.

mod reader;

use std::sync::LazyLock;

use regex::Regex;

use crate::command::format_number;
use crate::utils::format_duration;

pub use reader::DiagnosticLines;

/// Fraction below which no remaining-time estimate is offered.
pub const ESTIMATE_THRESHOLD: f64 = 0.01;

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"time=(\d{2,}):(\d{2}):(\d{2})\.(\d{2})").expect("valid time regex")
});
static FPS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"fps=\s*(\d+\.?\d*)").expect("valid fps regex"));
static BITRATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"bitrate=\s*(\d+\.?\d*\w*(?:/s)?)").expect("valid bitrate regex"));
static SPEED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"speed=\s*(\d+\.?\d*)x").expect("valid speed regex"));

/// Progress extracted from one diagnostic line.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSample {
    /// Media time already produced, in seconds
    pub elapsed: f64,
    pub fps: Option<f64>,
    /// Bitrate token as printed, e.g. `"1048.6kbits/s"`
    pub bitrate: Option<String>,
    /// Encoding speed as a multiple of real time
    pub speed: Option<f64>,
    /// `min(elapsed / total, 1)`; `None` when the total is unknown
    pub fraction: Option<f64>,
}

impl ProgressSample {
    /// Estimated seconds left, once the job is past [`ESTIMATE_THRESHOLD`].
    #[must_use]
    pub fn remaining_secs(&self) -> Option<f64> {
        self.fraction
            .filter(|f| *f > ESTIMATE_THRESHOLD)
            .map(|f| (self.elapsed * (1.0 / f - 1.0)).max(0.0))
    }
}

/// Classification of one diagnostic line.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineInfo {
    /// Present when the line carried a `time=` token
    pub sample: Option<ProgressSample>,
    /// Whether the line looks like an error report
    pub is_error: bool,
}

/// Converts `HH:MM:SS.CC` captures to seconds.
fn elapsed_from(caps: &regex::Captures<'_>) -> Option<f64> {
    let field = |i: usize| caps.get(i)?.as_str().parse::<f64>().ok();
    Some(field(1)? * 3600.0 + field(2)? * 60.0 + field(3)? + field(4)? / 100.0)
}

/// Case-insensitive "error"/"failed" heuristic.
#[must_use]
pub fn is_error_line(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    lower.contains("error") || lower.contains("failed")
}

/// Parses one line of engine stderr.
///
/// `total` is the expected output duration in seconds; without it samples
/// still carry elapsed time but no fraction.
#[must_use]
pub fn parse_line(line: &str, total: Option<f64>) -> LineInfo {
    let sample = TIME_RE
        .captures(line)
        .and_then(|caps| elapsed_from(&caps))
        .map(|elapsed| ProgressSample {
            elapsed,
            fps: FPS_RE
                .captures(line)
                .and_then(|c| c[1].parse().ok()),
            bitrate: BITRATE_RE.captures(line).map(|c| c[1].to_string()),
            speed: SPEED_RE
                .captures(line)
                .and_then(|c| c[1].parse().ok()),
            fraction: total
                .filter(|t| *t > 0.0)
                .map(|t| (elapsed / t).clamp(0.0, 1.0)),
        });

    LineInfo {
        sample,
        is_error: is_error_line(line),
    }
}

/// Builds the status line shown while a job runs.
///
/// `overall` is the job-wide fraction (after stage remapping); the sample's
/// own fraction drives the remaining-time estimate.
#[must_use]
pub fn format_status(sample: &ProgressSample, overall: Option<f64>) -> String {
    let mut parts = Vec::with_capacity(6);
    if let Some(f) = overall.or(sample.fraction) {
        parts.push(format!("Progress: {:.1}%", f * 100.0));
    }
    parts.push(format!("Time: {}", format_duration(sample.elapsed)));
    if let Some(fps) = sample.fps {
        parts.push(format!("FPS: {}", format_number(fps)));
    }
    if let Some(bitrate) = &sample.bitrate {
        parts.push(format!("Bitrate: {bitrate}"));
    }
    if let Some(speed) = sample.speed {
        parts.push(format!("Speed: {}x", format_number(speed)));
    }
    if let Some(remaining) = sample.remaining_secs() {
        let secs = remaining as u64;
        parts.push(format!("Remaining: {:02}:{:02}", secs / 60, secs % 60));
    }
    parts.join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATS: &str = "frame=  240 fps= 59.9 q=28.0 size=    1024kB time=00:00:08.00 bitrate=1048.6kbits/s speed=2.01x";

    #[test]
    fn test_parse_full_stats_line() {
        let info = parse_line(STATS, Some(16.0));
        let sample = info.sample.unwrap();
        assert_eq!(sample.elapsed, 8.0);
        assert_eq!(sample.fps, Some(59.9));
        assert_eq!(sample.bitrate.as_deref(), Some("1048.6kbits/s"));
        assert_eq!(sample.speed, Some(2.01));
        assert_eq!(sample.fraction, Some(0.5));
        assert!(!info.is_error);
    }

    #[test]
    fn test_centiseconds_and_hours() {
        let info = parse_line("size=N/A time=01:02:03.45 bitrate=N/A", None);
        let sample = info.sample.unwrap();
        assert!((sample.elapsed - 3723.45).abs() < 1e-9);
        assert_eq!(sample.fraction, None);
        assert_eq!(sample.bitrate, None);
    }

    #[test]
    fn test_lines_without_time_yield_no_sample() {
        assert_eq!(parse_line("Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'a.mp4':", Some(10.0)).sample, None);
        assert_eq!(parse_line("frame=1 time=N/A speed=N/A", Some(10.0)).sample, None);
    }

    #[test]
    fn test_zero_total_gives_unknown_fraction() {
        let sample = parse_line(STATS, Some(0.0)).sample.unwrap();
        assert_eq!(sample.fraction, None);
        assert_eq!(sample.remaining_secs(), None);
    }

    #[test]
    fn test_fraction_is_monotonic_and_clamped() {
        let total = 10.0;
        let mut last = 0.0;
        for tenth in 0..200 {
            let secs = tenth as f64 / 10.0;
            let line = format!(
                "time={:02}:{:02}:{:02}.{:02}",
                (secs / 3600.0) as u64,
                ((secs % 3600.0) / 60.0) as u64,
                (secs % 60.0) as u64,
                ((secs.fract()) * 100.0).round() as u64 % 100
            );
            let fraction = parse_line(&line, Some(total)).sample.unwrap().fraction.unwrap();
            assert!(fraction >= last, "{fraction} < {last} at {line}");
            assert!(fraction <= 1.0);
            last = fraction;
        }
        assert_eq!(last, 1.0);
    }

    #[test]
    fn test_error_heuristic_is_independent_of_progress() {
        assert!(parse_line("Conversion FAILED!", None).is_error);
        assert!(parse_line("[libx264 @ 0x1] Error while opening encoder", None).is_error);
        let info = parse_line("time=00:00:01.00 decode error", Some(2.0));
        assert!(info.is_error);
        assert!(info.sample.is_some());
        assert!(!parse_line("Stream mapping:", None).is_error);
    }

    #[test]
    fn test_remaining_estimate_threshold() {
        let early = parse_line("time=00:00:00.05", Some(10.0)).sample.unwrap();
        assert_eq!(early.remaining_secs(), None);

        let half = parse_line("time=00:00:30.00", Some(60.0)).sample.unwrap();
        assert_eq!(half.remaining_secs(), Some(30.0));
    }

    #[test]
    fn test_status_formatting() {
        let sample = parse_line(STATS, Some(16.0)).sample.unwrap();
        assert_eq!(
            format_status(&sample, Some(0.75)),
            "Progress: 75.0% | Time: 00:00:08 | FPS: 59.9 | Bitrate: 1048.6kbits/s | Speed: 2.01x | Remaining: 00:08"
        );

        let bare = parse_line("time=00:01:05.00", None).sample.unwrap();
        assert_eq!(format_status(&bare, None), "Time: 00:01:05");
    }
}
