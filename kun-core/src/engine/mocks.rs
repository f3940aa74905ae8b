// kun-core/src/engine/mocks.rs

// --- Mocking Infrastructure (for testing) ---

// Compiled for this crate's tests, or for others with the "test-mocks" feature.

use std::collections::{HashSet, VecDeque};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier, Mutex};

use super::locator::EngineLocator;
use super::process::{EngineExit, EngineProcess, EngineSpawner};
use crate::error::{CoreError, CoreResult};
use crate::probe::{MediaInfo, MediaProbe};

/// Exit code reported by a mock process after `terminate`.
pub const TERMINATED_EXIT_CODE: i32 = 255;

/// Scripted behaviour for one spawn.
#[derive(Debug, Clone)]
pub struct MockScript {
    /// Diagnostic text the process writes to stderr
    pub stderr: String,
    /// Exit code reported once the process finishes
    pub exit_code: i32,
    /// While set, the process keeps running
    pub hold: Option<Arc<AtomicBool>>,
    /// Spawning fails instead of starting a process
    pub fail_spawn: bool,
    /// Writes a file at the last argument (the output path) on spawn
    pub writes_output: bool,
    /// Reading stderr fails with this message once the text is consumed
    pub stderr_error: Option<String>,
    /// Spawn meets the test twice on this barrier: once on arrival and once
    /// before returning the process
    pub spawn_gate: Option<Arc<Barrier>>,
    /// Polling the process for its exit status fails
    pub fail_wait: bool,
}

impl MockScript {
    #[must_use]
    pub fn exiting(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stderr: stderr.into(),
            exit_code,
            hold: None,
            fail_spawn: false,
            writes_output: false,
            stderr_error: None,
            spawn_gate: None,
            fail_wait: false,
        }
    }

    #[must_use]
    pub fn held(mut self, hold: Arc<AtomicBool>) -> Self {
        self.hold = Some(hold);
        self
    }

    #[must_use]
    pub fn writing_output(mut self) -> Self {
        self.writes_output = true;
        self
    }

    #[must_use]
    pub fn failing_stderr(mut self, message: impl Into<String>) -> Self {
        self.stderr_error = Some(message.into());
        self
    }

    /// Pauses the spawn until the test passes the gate twice.
    #[must_use]
    pub fn gated(mut self, gate: Arc<Barrier>) -> Self {
        self.spawn_gate = Some(gate);
        self
    }

    #[must_use]
    pub fn failing_wait(mut self) -> Self {
        self.fail_wait = true;
        self
    }

    #[must_use]
    pub fn spawn_failure() -> Self {
        Self {
            fail_spawn: true,
            ..Self::exiting(0, "")
        }
    }
}

/// Yields its text, then fails.
struct FailingReader {
    text: Cursor<Vec<u8>>,
    message: String,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.text.read(buf)? {
            0 => Err(io::Error::other(self.message.clone())),
            n => Ok(n),
        }
    }
}

/// Mock implementation of EngineProcess.
pub struct MockEngineProcess {
    stderr: Option<Vec<u8>>,
    stderr_error: Option<String>,
    fail_wait: bool,
    exit_code: i32,
    hold: Option<Arc<AtomicBool>>,
    terminated: Arc<AtomicBool>,
}

impl EngineProcess for MockEngineProcess {
    fn take_stderr(&mut self) -> Option<Box<dyn Read + Send>> {
        let bytes = self.stderr.take()?;
        let reader: Box<dyn Read + Send> = match self.stderr_error.take() {
            Some(message) => Box::new(FailingReader {
                text: Cursor::new(bytes),
                message,
            }),
            None => Box::new(Cursor::new(bytes)),
        };
        Some(reader)
    }

    fn try_wait(&mut self) -> CoreResult<Option<EngineExit>> {
        if self.fail_wait {
            return Err(CoreError::Io(io::Error::other("mock wait failure")));
        }
        if self.terminated.load(Ordering::SeqCst) {
            return Ok(Some(EngineExit {
                code: Some(TERMINATED_EXIT_CODE),
            }));
        }
        if self.hold.as_ref().is_some_and(|h| h.load(Ordering::SeqCst)) {
            return Ok(None);
        }
        Ok(Some(EngineExit {
            code: Some(self.exit_code),
        }))
    }

    fn terminate(&mut self) -> CoreResult<()> {
        self.terminated.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Mock implementation of EngineSpawner: pops one script per spawn and
/// records every invocation.
#[derive(Clone, Default)]
pub struct MockEngineSpawner {
    scripts: Arc<Mutex<VecDeque<MockScript>>>,
    received_calls: Arc<Mutex<Vec<Vec<String>>>>,
    terminations: Arc<Mutex<Vec<Arc<AtomicBool>>>>,
}

impl MockEngineSpawner {
    #[must_use]
    pub fn new(scripts: impl IntoIterator<Item = MockScript>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts.into_iter().collect())),
            ..Self::default()
        }
    }

    /// Argument vectors received so far, one per spawn.
    #[must_use]
    pub fn received_calls(&self) -> Vec<Vec<String>> {
        self.received_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Whether the n-th spawned process was asked to terminate.
    #[must_use]
    pub fn was_terminated(&self, index: usize) -> bool {
        self.terminations
            .lock()
            .ok()
            .and_then(|t| t.get(index).map(|flag| flag.load(Ordering::SeqCst)))
            .unwrap_or(false)
    }
}

impl EngineSpawner for MockEngineSpawner {
    type Process = MockEngineProcess;

    fn spawn(&self, _program: &Path, args: &[String]) -> CoreResult<Self::Process> {
        if let Ok(mut calls) = self.received_calls.lock() {
            calls.push(args.to_vec());
        }
        let script = self
            .scripts
            .lock()
            .ok()
            .and_then(|mut s| s.pop_front())
            .unwrap_or_else(|| MockScript::exiting(0, ""));

        if script.fail_spawn {
            return Err(CoreError::CommandStart(
                "mock ffmpeg".to_string(),
                io::Error::new(io::ErrorKind::PermissionDenied, "mock spawn failure"),
            ));
        }
        if script.writes_output {
            if let Some(output) = args.last() {
                std::fs::write(output, b"mock output")?;
            }
        }

        if let Some(gate) = &script.spawn_gate {
            gate.wait();
            gate.wait();
        }

        let terminated = Arc::new(AtomicBool::new(false));
        if let Ok(mut t) = self.terminations.lock() {
            t.push(terminated.clone());
        }
        Ok(MockEngineProcess {
            stderr: Some(script.stderr.into_bytes()),
            stderr_error: script.stderr_error,
            fail_wait: script.fail_wait,
            exit_code: script.exit_code,
            hold: script.hold,
            terminated,
        })
    }
}

/// Locator with a fixed answer.
#[derive(Debug, Clone, Default)]
pub struct MockLocator {
    pub path: Option<PathBuf>,
    pub capabilities: HashSet<String>,
}

impl MockLocator {
    #[must_use]
    pub fn available(capabilities: &[&str]) -> Self {
        Self {
            path: Some(PathBuf::from("/mock/bin/ffmpeg")),
            capabilities: capabilities.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[must_use]
    pub fn unavailable() -> Self {
        Self::default()
    }
}

impl EngineLocator for MockLocator {
    fn locate(&self) -> Option<PathBuf> {
        self.path.clone()
    }

    fn capabilities(&self) -> HashSet<String> {
        self.capabilities.clone()
    }
}

/// Prober with a fixed answer.
#[derive(Debug, Clone, Default)]
pub struct MockProbe {
    pub info: Option<MediaInfo>,
}

impl MockProbe {
    #[must_use]
    pub fn with_duration(seconds: f64) -> Self {
        Self {
            info: Some(MediaInfo {
                duration: Some(seconds),
                ..MediaInfo::default()
            }),
        }
    }
}

impl MediaProbe for MockProbe {
    fn probe(&self, _path: &Path) -> Option<MediaInfo> {
        self.info.clone()
    }
}
