//! Runs a job with a terminal progress bar attached.
//!
//! Ctrl-C is routed to [`JobRunner::cancel`], so ffmpeg is stopped and the
//! runner's scratch files are removed before the process exits.

use anyhow::{Result, bail};
use indicatif::ProgressBar;
use kun_core::engine::EngineSpawner;
use kun_core::{JobObserver, JobOutcome, JobRunner, JobSpec, format_bytes};
use log::{debug, info, warn};
use std::sync::Arc;

use crate::output::{bar_position, create_progress_bar, print_success};

/// Forwards runner events to the progress bar.
///
/// Progress summaries replace the bar's message; every other status is
/// printed above the bar so it stays in the scrollback.
struct TerminalObserver {
    bar: ProgressBar,
}

impl JobObserver for TerminalObserver {
    fn on_progress(&self, fraction: f64) {
        self.bar.set_position(bar_position(fraction));
    }

    fn on_status(&self, message: &str) {
        if message.starts_with("Progress:") || message.starts_with("Time:") {
            self.bar.set_message(message.to_string());
        } else {
            self.bar.suspend(|| eprintln!("{message}"));
        }
    }

    fn on_log(&self, line: &str) {
        debug!(target: "ffmpeg", "{}", line);
    }
}

/// Cancels the runner's job when called. Installed as the Ctrl-C handler.
fn interrupt_handler<S: EngineSpawner + 'static>(
    runner: &Arc<JobRunner<S>>,
) -> impl FnMut() + Send + 'static {
    let runner = Arc::clone(runner);
    move || {
        info!("Interrupted, cancelling the running job");
        runner.cancel();
    }
}

fn install_interrupt_handler<S: EngineSpawner + 'static>(runner: &Arc<JobRunner<S>>) {
    if let Err(e) = ctrlc::set_handler(interrupt_handler(runner)) {
        warn!("Ctrl-C will not cancel the job: {}", e);
    }
}

/// Runs `spec` to completion, failing unless the job succeeds.
pub fn run_with_progress<S: EngineSpawner + 'static>(
    runner: &Arc<JobRunner<S>>,
    spec: &JobSpec,
) -> Result<()> {
    install_interrupt_handler(runner);

    let observer = TerminalObserver {
        bar: create_progress_bar(spec.kind().label()),
    };
    let outcome = runner.run_job(spec, &observer);
    observer.bar.finish_and_clear();

    report_outcome(outcome, spec)
}

fn report_outcome(outcome: JobOutcome, spec: &JobSpec) -> Result<()> {
    let label = spec.kind().label();
    match outcome {
        JobOutcome::Succeeded => {
            let output = spec.output();
            match std::fs::metadata(output) {
                Ok(meta) => print_success(&format!(
                    "Wrote {} ({})",
                    output.display(),
                    format_bytes(meta.len())
                )),
                Err(_) => print_success(&format!("Wrote {}", output.display())),
            }
            Ok(())
        }
        JobOutcome::Cancelled => bail!(
            "{label} was cancelled; {} was not written",
            spec.output().display()
        ),
        JobOutcome::Rejected => bail!("{label} was not started"),
        JobOutcome::Failed => bail!("{label} of {} failed", spec.input().display()),
    }
}
