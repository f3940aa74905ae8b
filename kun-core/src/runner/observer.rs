//! Listener interface for job events.
//!
//! Progress, status and raw log lines for one job arrive in the order the
//! engine produced them. Callbacks may be invoked from the runner's monitor
//! thread, hence the `Send + Sync` bound.

/// Receives a job's events. Every method defaults to a no-op.
pub trait JobObserver: Send + Sync {
    /// Job-wide fraction complete in `[0, 1]`. Not called while unknown.
    fn on_progress(&self, _fraction: f64) {}

    /// Human-readable state change or progress summary.
    fn on_status(&self, _message: &str) {}

    /// One raw line of engine output, or the command about to run.
    fn on_log(&self, _line: &str) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl JobObserver for NoopObserver {}

/// Adapts three closures to [`JobObserver`].
pub struct Callbacks<P, S, L> {
    progress: P,
    status: S,
    log: L,
}

impl<P, S, L> Callbacks<P, S, L>
where
    P: Fn(f64) + Send + Sync,
    S: Fn(&str) + Send + Sync,
    L: Fn(&str) + Send + Sync,
{
    pub fn new(progress: P, status: S, log: L) -> Self {
        Self {
            progress,
            status,
            log,
        }
    }
}

impl<P, S, L> JobObserver for Callbacks<P, S, L>
where
    P: Fn(f64) + Send + Sync,
    S: Fn(&str) + Send + Sync,
    L: Fn(&str) + Send + Sync,
{
    fn on_progress(&self, fraction: f64) {
        (self.progress)(fraction);
    }

    fn on_status(&self, message: &str) {
        (self.status)(message);
    }

    fn on_log(&self, line: &str) {
        (self.log)(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_callbacks_forward_events() {
        let seen = Mutex::new(Vec::new());
        let observer = Callbacks::new(
            |f| seen.lock().unwrap().push(format!("progress {f}")),
            |s| seen.lock().unwrap().push(format!("status {s}")),
            |l| seen.lock().unwrap().push(format!("log {l}")),
        );
        observer.on_log("frame=1");
        observer.on_progress(0.5);
        observer.on_status("done");
        NoopObserver.on_status("ignored");
        drop(observer);
        assert_eq!(
            seen.into_inner().unwrap(),
            vec!["log frame=1", "progress 0.5", "status done"]
        );
    }
}
