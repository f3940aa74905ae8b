// ============================================================================
// kun-core/src/runner/mod.rs
// ============================================================================
//
// JOB RUNNER: One Engine Job at a Time
//
// The runner owns the lifecycle of every engine process: it accepts a job,
// probes the source, plans the engine runs, spawns each one, streams its
// stderr through the progress parser on a monitor thread, and waits for the
// exit status. A single busy flag guarantees that at most one job is in
// flight; it is claimed atomically on acceptance and released by a drop guard
// so every return path, panics included, leaves the runner idle.
//
// KEY COMPONENTS:
// - JobRunner: run / cancel / is_busy / probe
// - JobOutcome: terminal state of a job
// - JobObserver, Callbacks, NoopObserver: event listeners
//
// STATE MACHINE:
// Idle -> Accepted -> Running -> {Succeeded | Failed | Cancelled} -> Idle
//
// `run` blocks until the job ends. Callers keep their UI responsive by
// calling it from a worker thread; `cancel` and `is_busy` never block on it.

mod observer;

use std::io::Read;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use tempfile::TempDir;

use crate::command::{self, PipelineStep, PlanContext};
use crate::config::CoreConfig;
use crate::engine::{EngineExit, EngineLocator, EngineProcess, EngineSpawner, SidecarSpawner, SystemLocator};
use crate::error::{CoreError, CoreResult};
use crate::hardware_accel::{self, HwAccelChoice};
use crate::job::{GifMode, JobSpec};
use crate::probe::{MediaInfo, MediaProbe, MediaProber};
use crate::progress::{self, DiagnosticLines};

pub use observer::{Callbacks, JobObserver, NoopObserver};

pub const STATUS_UNAVAILABLE: &str = "FFmpeg is not available";
pub const STATUS_BUSY: &str = "Another job is already running";
pub const STATUS_STARTING: &str = "Starting conversion...";
pub const STATUS_COMPLETE: &str = "Conversion complete";
pub const STATUS_CANCELLED: &str = "Conversion cancelled";

/// Terminal state of one `run_job` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// Every engine run exited with status 0.
    Succeeded,
    /// An engine run exited non-zero, or spawning/monitoring failed.
    Failed,
    /// `cancel` was called while the job was in flight.
    Cancelled,
    /// Refused before anything was spawned (engine unavailable or busy).
    Rejected,
}

impl JobOutcome {
    #[must_use]
    pub fn is_success(self) -> bool {
        self == JobOutcome::Succeeded
    }
}

/// Runs transcode and GIF jobs, one at a time.
///
/// # Examples
///
/// ```rust,no_run
/// use kun_core::{CoreConfig, JobRunner, NoopObserver, TranscodeJobSpec};
///
/// let runner = JobRunner::new(CoreConfig::default());
/// let spec = TranscodeJobSpec::builder("in.mov", "out.mp4").crf(23).build().unwrap();
/// let ok = runner.run(&spec.into(), &NoopObserver);
/// assert!(!runner.is_busy());
/// # let _ = ok;
/// ```
pub struct JobRunner<S: EngineSpawner = SidecarSpawner> {
    spawner: S,
    locator: Arc<dyn EngineLocator>,
    prober: Arc<dyn MediaProbe>,
    config: CoreConfig,
    busy: AtomicBool,
    cancel_requested: AtomicBool,
    active: Mutex<Option<S::Process>>,
}

impl JobRunner<SidecarSpawner> {
    /// Runner backed by the system ffmpeg.
    #[must_use]
    pub fn new(config: CoreConfig) -> Self {
        let locator: Arc<dyn EngineLocator> = Arc::new(SystemLocator::new(&config));
        let prober = Arc::new(MediaProber::new(locator.clone(), &config));
        Self::with_parts(SidecarSpawner, locator, prober, config)
    }
}

/// Releases the busy flag and drops any stale process handle.
struct BusyGuard<'a, S: EngineSpawner> {
    runner: &'a JobRunner<S>,
}

impl<S: EngineSpawner> Drop for BusyGuard<'_, S> {
    fn drop(&mut self) {
        self.runner.lock_active().take();
        self.runner.cancel_requested.store(false, Ordering::SeqCst);
        self.runner.busy.store(false, Ordering::Release);
    }
}

impl<S: EngineSpawner> JobRunner<S> {
    #[must_use]
    pub fn with_parts(
        spawner: S,
        locator: Arc<dyn EngineLocator>,
        prober: Arc<dyn MediaProbe>,
        config: CoreConfig,
    ) -> Self {
        Self {
            spawner,
            locator,
            prober,
            config,
            busy: AtomicBool::new(false),
            cancel_requested: AtomicBool::new(false),
            active: Mutex::new(None),
        }
    }

    /// True between a job's acceptance and its cleanup.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn locator(&self) -> &Arc<dyn EngineLocator> {
        &self.locator
    }

    /// Probes a media file. `None` when the engine is unavailable or the
    /// probe fails for any reason.
    #[must_use]
    pub fn probe(&self, path: &Path) -> Option<MediaInfo> {
        if self.locator.locate().is_none() {
            log::warn!("Cannot probe {}: {}", path.display(), STATUS_UNAVAILABLE);
            return None;
        }
        self.prober.probe(path)
    }

    /// Runs a job to completion. Returns `true` only on success.
    pub fn run(&self, spec: &JobSpec, observer: &dyn JobObserver) -> bool {
        self.run_job(spec, observer).is_success()
    }

    /// Runs a job to completion and reports how it ended.
    pub fn run_job(&self, spec: &JobSpec, observer: &dyn JobObserver) -> JobOutcome {
        if self.locator.locate().is_none() {
            log::warn!("Rejecting {}: engine unavailable", spec.kind().label());
            observer.on_status(STATUS_UNAVAILABLE);
            return JobOutcome::Rejected;
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::warn!("Rejecting {}: another job is running", spec.kind().label());
            observer.on_status(STATUS_BUSY);
            return JobOutcome::Rejected;
        }
        let _guard = BusyGuard { runner: self };
        // A cancel that raced the previous job's cleanup belongs to that job.
        self.cancel_requested.store(false, Ordering::SeqCst);

        log::info!(
            "Starting {}: {} -> {}",
            spec.kind().label(),
            spec.input().display(),
            spec.output().display()
        );
        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| self.execute(spec, observer))) {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                log::error!("{} failed: {}", spec.kind().label(), e);
                observer.on_status(&format!("Error: {e}"));
                JobOutcome::Failed
            }
            Err(_) => {
                // The observer itself may be what panicked; do not call it again.
                log::error!("{} aborted by a panic", spec.kind().label());
                JobOutcome::Failed
            }
        };
        log::info!("Finished {}: {:?}", spec.kind().label(), outcome);
        outcome
    }

    /// Requests termination of the running engine process, if any.
    ///
    /// Returns immediately. The running job observes the exit and finishes
    /// with [`JobOutcome::Cancelled`]. A cancel that arrives before the
    /// process is spawned takes effect right after the spawn.
    pub fn cancel(&self) {
        if !self.is_busy() {
            log::debug!("Cancel requested with no job running");
            return;
        }
        self.cancel_requested.store(true, Ordering::SeqCst);
        if let Some(process) = self.lock_active().as_mut() {
            log::info!("Cancelling running ffmpeg process");
            if let Err(e) = process.terminate() {
                log::warn!("Failed to terminate ffmpeg: {}", e);
            }
        }
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<S::Process>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cancelled(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    /// Palette scratch space for two-stage GIFs, removed when dropped.
    fn scratch_dir(&self, spec: &JobSpec) -> CoreResult<Option<TempDir>> {
        if !matches!(spec, JobSpec::Gif(gif) if gif.mode == GifMode::TwoStage) {
            return Ok(None);
        }
        let mut builder = tempfile::Builder::new();
        builder.prefix("kun-palette-");
        let dir = match &self.config.temp_dir {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        Ok(Some(dir))
    }

    fn execute(&self, spec: &JobSpec, observer: &dyn JobObserver) -> CoreResult<JobOutcome> {
        let engine = self.locator.locate().ok_or(CoreError::EngineNotFound)?;
        observer.on_status(STATUS_STARTING);

        let source_duration = self.prober.probe(spec.input()).and_then(|info| info.duration);
        if source_duration.is_none() {
            log::warn!("Source duration unknown; progress will not be reported");
        }

        let hwaccel = match spec.hwaccel_request() {
            HwAccelChoice::Disabled => None,
            choice => hardware_accel::resolve(&choice, &self.locator.capabilities()),
        };

        let scratch = self.scratch_dir(spec)?;
        let palette_path = scratch
            .as_ref()
            .map(|dir| dir.path().join("palette.png"))
            .unwrap_or_else(PathBuf::new);

        let pipeline = command::plan(
            spec,
            &PlanContext {
                source_duration,
                hwaccel,
                palette_path,
            },
        );

        let total = pipeline.len();
        for (index, step) in pipeline.steps().iter().enumerate() {
            if self.cancelled() {
                observer.on_status(STATUS_CANCELLED);
                return Ok(JobOutcome::Cancelled);
            }
            if total > 1 {
                observer.on_status(&format!("Stage {}/{}: {}", index + 1, total, step.label));
            }

            let exit = self.run_step(&engine, step, observer)?;

            if self.cancelled() {
                observer.on_status(STATUS_CANCELLED);
                return Ok(JobOutcome::Cancelled);
            }
            if !exit.success() {
                let reason = match exit.code {
                    Some(code) => format!("exit code {code}"),
                    None => "terminated by signal".to_string(),
                };
                log::error!("ffmpeg {} stage failed: {}", step.label, reason);
                observer.on_status(&format!("Conversion failed ({reason})"));
                return Ok(JobOutcome::Failed);
            }
        }

        observer.on_status(STATUS_COMPLETE);
        Ok(JobOutcome::Succeeded)
    }

    fn run_step(
        &self,
        engine: &Path,
        step: &PipelineStep,
        observer: &dyn JobObserver,
    ) -> CoreResult<EngineExit> {
        observer.on_log(&format!("Command: {} {}", engine.display(), step.args.join(" ")));

        let mut process = self.spawner.spawn(engine, &step.args)?;
        let stderr = process.take_stderr();
        {
            let mut active = self.lock_active();
            let process = active.insert(process);
            if self.cancelled() {
                log::info!("Cancel arrived before spawn completed, terminating");
                if let Err(e) = process.terminate() {
                    log::warn!("Failed to terminate ffmpeg: {}", e);
                }
            }
        }

        let exit = thread::scope(|scope| {
            let monitor = stderr.map(|stderr| scope.spawn(move || monitor_stream(stderr, step, observer)));
            let exit = self.wait_for_exit();
            if let Some(handle) = monitor {
                if handle.join().is_err() {
                    log::warn!("Output monitor for {} stage panicked", step.label);
                }
            }
            exit
        });

        self.lock_active().take();
        exit
    }

    /// Polls the active process until it exits.
    fn wait_for_exit(&self) -> CoreResult<EngineExit> {
        loop {
            let polled = {
                let mut active = self.lock_active();
                let process = active.as_mut().ok_or_else(|| {
                    CoreError::Io(std::io::Error::other("engine process handle missing"))
                })?;
                match process.try_wait() {
                    Err(e) => {
                        if let Err(term) = process.terminate() {
                            log::warn!("Failed to terminate ffmpeg: {}", term);
                        }
                        return Err(e);
                    }
                    Ok(status) => status,
                }
            };
            match polled {
                Some(exit) => return Ok(exit),
                None => thread::sleep(self.config.poll_interval),
            }
        }
    }
}

/// Drains one engine's stderr, forwarding every line and its parse.
fn monitor_stream(stderr: Box<dyn Read + Send>, step: &PipelineStep, observer: &dyn JobObserver) {
    for line in DiagnosticLines::new(stderr) {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::warn!("Stopped reading ffmpeg output: {}", e);
                observer.on_status(&format!("Monitor error: {e}"));
                return;
            }
        };

        observer.on_log(&line);
        let info = progress::parse_line(&line, step.expected_duration);
        if let Some(sample) = &info.sample {
            let overall = sample.fraction.map(|f| step.remap(f));
            if let Some(fraction) = overall {
                observer.on_progress(fraction);
            }
            observer.on_status(&progress::format_status(sample, overall));
        }
        if info.is_error {
            observer.on_status(&format!("Error: {line}"));
        }
    }
}

#[cfg(test)]
mod tests;
