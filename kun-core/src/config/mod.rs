//! Configuration structures and constants for the kun-core library.
//!
//! This module controls how the engine is located and how processes are
//! supervised. Job options themselves live in [`crate::job`].

mod builder;

use std::path::PathBuf;
use std::time::Duration;

pub use builder::CoreConfigBuilder;

// Default constants

/// How long the media prober may wait for ffprobe/ffmpeg before giving up.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// How long a `-version` check may take before a candidate engine is rejected.
pub const DEFAULT_VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Interval at which the job runner polls the engine process for exit.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Configuration for the kun-core library.
///
/// # Examples
///
/// ```rust
/// use kun_core::config::CoreConfigBuilder;
/// use std::time::Duration;
///
/// let config = CoreConfigBuilder::new()
///     .engine_path("/opt/ffmpeg/bin/ffmpeg")
///     .probe_timeout(Duration::from_secs(10))
///     .build();
/// assert_eq!(config.probe_timeout, Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Explicit ffmpeg executable; when unset the locator searches for one
    pub engine_path: Option<PathBuf>,

    /// Timeout applied to each media probe invocation
    pub probe_timeout: Duration,

    /// Timeout applied to each `-version` availability check
    pub version_check_timeout: Duration,

    /// Poll interval of the job runner's exit-wait loop
    pub poll_interval: Duration,

    /// Optional parent directory for scratch files (defaults to the system temp dir)
    pub temp_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            engine_path: None,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            version_check_timeout: DEFAULT_VERSION_CHECK_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            temp_dir: None,
        }
    }
}
