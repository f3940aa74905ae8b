// ============================================================================
// kun-core/src/engine/locator.rs
// ============================================================================
//
// ENGINE LOCATOR: Finding a Usable ffmpeg and Asking What It Supports
//
// KEY COMPONENTS:
// - EngineLocator: collaborator trait consumed by the runner and prober
// - SystemLocator: override path, ffmpeg-sidecar's path, then well-known
//   candidates, each confirmed with `-version`
// - check_dependency: the `-version` probe itself
//
// Results are cached for the locator's lifetime. Downloading an engine when
// none is found is left to the embedding application.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use std::time::Duration;

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::hardware_accel::parse_hwaccels;
use crate::utils::run_with_timeout;

/// Places searched when no explicit engine path is configured.
pub const CANDIDATE_PATHS: [&str; 6] = [
    "ffmpeg",
    "ffmpeg.exe",
    "/usr/bin/ffmpeg",
    "/usr/local/bin/ffmpeg",
    "./ffmpeg",
    "./ffmpeg.exe",
];

/// Resolves the engine executable and its hardware capabilities.
pub trait EngineLocator: Send + Sync {
    /// Path of a working ffmpeg, or `None` when there is none.
    fn locate(&self) -> Option<PathBuf>;

    /// Hardware acceleration backends the engine reports, lowercase.
    fn capabilities(&self) -> HashSet<String>;
}

/// Runs `program -version` and reports whether it exits successfully.
pub fn check_dependency(program: &Path, timeout: Duration) -> CoreResult<()> {
    let output = run_with_timeout(Command::new(program).arg("-version"), timeout)?;
    if output.status.success() {
        log::debug!("Found dependency: {}", program.display());
        Ok(())
    } else {
        Err(crate::error::command_failed_error(
            program.display().to_string(),
            output.status,
            output.stderr,
        ))
    }
}

/// Sibling ffprobe of an ffmpeg path (`/opt/bin/ffmpeg` -> `/opt/bin/ffprobe`).
#[must_use]
pub fn ffprobe_path_for(engine: &Path) -> Option<PathBuf> {
    let name = engine.file_name()?.to_str()?;
    if !name.contains("ffmpeg") {
        return None;
    }
    Some(engine.with_file_name(name.replacen("ffmpeg", "ffprobe", 1)))
}

/// Locator backed by the local file system and `PATH`.
#[derive(Debug)]
pub struct SystemLocator {
    override_path: Option<PathBuf>,
    timeout: Duration,
    located: OnceLock<Option<PathBuf>>,
    capabilities: OnceLock<HashSet<String>>,
}

impl SystemLocator {
    #[must_use]
    pub fn new(config: &CoreConfig) -> Self {
        Self {
            override_path: config.engine_path.clone(),
            timeout: config.version_check_timeout,
            located: OnceLock::new(),
            capabilities: OnceLock::new(),
        }
    }

    /// Paths tried in order. An explicit override is the only candidate.
    fn candidates(&self) -> Vec<PathBuf> {
        if let Some(path) = &self.override_path {
            return vec![path.clone()];
        }
        let mut candidates = vec![ffmpeg_sidecar::paths::ffmpeg_path()];
        for path in CANDIDATE_PATHS.iter().map(PathBuf::from) {
            if !candidates.contains(&path) {
                candidates.push(path);
            }
        }
        candidates
    }

    fn search(&self) -> Option<PathBuf> {
        let found = self
            .candidates()
            .into_iter()
            .find(|path| match check_dependency(path, self.timeout) {
                Ok(()) => true,
                Err(e) => {
                    log::debug!("Engine candidate {} rejected: {}", path.display(), e);
                    false
                }
            });
        match &found {
            Some(path) => log::info!("Using ffmpeg at {}", path.display()),
            None => log::warn!("No usable ffmpeg executable found"),
        }
        found
    }

    fn query_capabilities(&self) -> CoreResult<HashSet<String>> {
        let engine = self.locate().ok_or(CoreError::EngineNotFound)?;
        let output = run_with_timeout(
            Command::new(&engine).args(["-hide_banner", "-hwaccels"]),
            self.timeout,
        )?;
        Ok(parse_hwaccels(&output.stdout))
    }
}

impl EngineLocator for SystemLocator {
    fn locate(&self) -> Option<PathBuf> {
        self.located.get_or_init(|| self.search()).clone()
    }

    fn capabilities(&self) -> HashSet<String> {
        self.capabilities
            .get_or_init(|| {
                self.query_capabilities().unwrap_or_else(|e| {
                    log::warn!("Could not query hardware acceleration support: {}", e);
                    HashSet::new()
                })
            })
            .clone()
    }
}
