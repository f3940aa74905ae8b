// ============================================================================
// kun-core/src/engine/process.rs
// ============================================================================
//
// ENGINE PROCESS: Spawning and Supervising ffmpeg
//
// The job runner never touches `std::process` or ffmpeg-sidecar directly. It
// spawns through an EngineSpawner and drives the result through the
// EngineProcess trait, which keeps the runner testable with scripted mocks.
//
// KEY COMPONENTS:
// - EngineSpawner / EngineProcess: the process seam
// - EngineExit: terminal status of an engine run
// - SidecarSpawner / SidecarProcess: implementation on ffmpeg-sidecar

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;

use super::platform;
use crate::error::{CoreResult, command_start_error, command_wait_error};

/// Terminal status of an engine process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineExit {
    /// Exit code; `None` when the process was ended by a signal
    pub code: Option<i32>,
}

impl EngineExit {
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// A running engine process.
pub trait EngineProcess: Send {
    /// Hands out the diagnostic stream. Returns `None` after the first call.
    fn take_stderr(&mut self) -> Option<Box<dyn Read + Send>>;

    /// Non-blocking exit check.
    fn try_wait(&mut self) -> CoreResult<Option<EngineExit>>;

    /// Asks the process to stop. Does not wait for exit; a process that
    /// ignores the request is killed by a later `try_wait`.
    fn terminate(&mut self) -> CoreResult<()>;
}

/// Creates engine processes.
pub trait EngineSpawner: Send + Sync {
    type Process: EngineProcess;

    /// Starts `program` with `args`, stderr piped.
    fn spawn(&self, program: &Path, args: &[String]) -> CoreResult<Self::Process>;
}

/// How long ffmpeg gets to honour a quit request before it is killed.
pub const QUIT_GRACE_PERIOD: Duration = Duration::from_secs(3);

/// Wrapper around `ffmpeg_sidecar::child::FfmpegChild` implementing `EngineProcess`.
pub struct SidecarProcess {
    child: FfmpegChild,
    quit_requested: Option<Instant>,
}

impl SidecarProcess {
    fn new(child: FfmpegChild) -> Self {
        Self {
            child,
            quit_requested: None,
        }
    }
}

impl EngineProcess for SidecarProcess {
    fn take_stderr(&mut self) -> Option<Box<dyn Read + Send>> {
        self.child
            .take_stderr()
            .map(|stderr| Box::new(stderr) as Box<dyn Read + Send>)
    }

    fn try_wait(&mut self) -> CoreResult<Option<EngineExit>> {
        let status = self
            .child
            .as_inner_mut()
            .try_wait()
            .map_err(|e| command_wait_error("ffmpeg", e))?;
        if let Some(status) = status {
            return Ok(Some(EngineExit { code: status.code() }));
        }

        if self
            .quit_requested
            .is_some_and(|at| at.elapsed() >= QUIT_GRACE_PERIOD)
        {
            log::warn!("ffmpeg ignored the quit request, killing it");
            self.quit_requested = None;
            self.child.kill()?;
        }
        Ok(None)
    }

    fn terminate(&mut self) -> CoreResult<()> {
        if self.quit_requested.is_none() {
            self.quit_requested = Some(Instant::now());
        }
        platform::terminate(&mut self.child)?;
        Ok(())
    }
}

/// Concrete implementation of `EngineSpawner` using `ffmpeg-sidecar`.
#[derive(Debug, Clone, Default)]
pub struct SidecarSpawner;

impl EngineSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn spawn(&self, program: &Path, args: &[String]) -> CoreResult<Self::Process> {
        // Built from a plain Command so the argument vector reaches ffmpeg
        // verbatim; stdin stays piped for the graceful `q` quit.
        let mut inner = Command::new(program);
        inner
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        log::debug!("Spawning {} {}", program.display(), args.join(" "));
        FfmpegCommand::from(inner)
            .spawn()
            .map(SidecarProcess::new)
            .map_err(|e| {
                log::error!("Failed to spawn {}: {}", program.display(), e);
                command_start_error(program.display().to_string(), e)
            })
    }
}
