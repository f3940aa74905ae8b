// ============================================================================
// kun-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// Fluent construction of CoreConfig. Every field starts at its DEFAULT_*
// value, so callers only name what they want to change.

// ---- Standard library imports ----
use std::path::PathBuf;
use std::time::Duration;

// ---- Internal crate imports ----
use super::CoreConfig;

/// Builder for creating CoreConfig instances.
#[derive(Debug, Clone, Default)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl CoreConfigBuilder {
    /// Creates a new CoreConfigBuilder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses the given ffmpeg executable instead of searching for one.
    #[must_use]
    pub fn engine_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.engine_path = Some(path.into());
        self
    }

    /// Sets the per-invocation timeout for media probing.
    #[must_use]
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe_timeout = timeout;
        self
    }

    /// Sets the timeout for `-version` availability checks.
    #[must_use]
    pub fn version_check_timeout(mut self, timeout: Duration) -> Self {
        self.config.version_check_timeout = timeout;
        self
    }

    /// Sets how often the runner polls a running engine for exit.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Sets the parent directory for scratch files.
    #[must_use]
    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = Some(dir.into());
        self
    }

    /// Builds the CoreConfig.
    #[must_use]
    pub fn build(self) -> CoreConfig {
        self.config
    }
}
