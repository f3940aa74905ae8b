use super::*;
use crate::config::CoreConfigBuilder;
use crate::engine::mocks::{MockEngineSpawner, MockLocator, MockProbe, MockScript, TERMINATED_EXIT_CODE};
use crate::job::{GifJobSpec, TranscodeJobSpec};
use std::sync::Barrier;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

const PROGRESS_HALF: &str =
    "frame=  150 fps= 30 q=28.0 size=     256kB time=00:00:05.00 bitrate= 419.4kbits/s speed=1.5x\n";
const PROGRESS_DONE: &str =
    "frame=  300 fps= 30 q=28.0 size=     512kB time=00:00:10.00 bitrate= 419.4kbits/s speed=1.5x\n";

#[derive(Default)]
struct Recorder {
    progress: Mutex<Vec<f64>>,
    statuses: Mutex<Vec<String>>,
    logs: Mutex<Vec<String>>,
}

impl Recorder {
    fn progress(&self) -> Vec<f64> {
        self.progress.lock().unwrap().clone()
    }

    fn statuses(&self) -> Vec<String> {
        self.statuses.lock().unwrap().clone()
    }

    fn logs(&self) -> Vec<String> {
        self.logs.lock().unwrap().clone()
    }
}

impl JobObserver for Recorder {
    fn on_progress(&self, fraction: f64) {
        self.progress.lock().unwrap().push(fraction);
    }

    fn on_status(&self, message: &str) {
        self.statuses.lock().unwrap().push(message.to_string());
    }

    fn on_log(&self, line: &str) {
        self.logs.lock().unwrap().push(line.to_string());
    }
}

struct PanickingObserver;

impl JobObserver for PanickingObserver {
    fn on_status(&self, _message: &str) {
        panic!("observer failure");
    }
}

fn runner_with(
    spawner: &MockEngineSpawner,
    locator: MockLocator,
    probe: MockProbe,
) -> JobRunner<MockEngineSpawner> {
    let config = CoreConfigBuilder::new()
        .poll_interval(Duration::from_millis(1))
        .build();
    JobRunner::with_parts(spawner.clone(), Arc::new(locator), Arc::new(probe), config)
}

fn transcode_job() -> JobSpec {
    TranscodeJobSpec::builder("/media/in.mov", "/media/out.mp4")
        .crf(23)
        .build()
        .unwrap()
        .into()
}

fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_unavailable_engine_rejects_without_spawning() {
    let spawner = MockEngineSpawner::new([]);
    let runner = runner_with(&spawner, MockLocator::unavailable(), MockProbe::with_duration(10.0));
    let recorder = Recorder::default();

    assert!(!runner.run(&transcode_job(), &recorder));
    assert_eq!(recorder.statuses(), vec![STATUS_UNAVAILABLE]);
    assert!(spawner.received_calls().is_empty());
    assert!(runner.probe(Path::new("/media/in.mov")).is_none());
    assert!(!runner.is_busy());
}

#[test]
fn test_successful_transcode_reports_progress() {
    let spawner = MockEngineSpawner::new([MockScript::exiting(
        0,
        format!("Input #0, mov,mp4, from 'in.mov':\n{PROGRESS_HALF}{PROGRESS_DONE}"),
    )]);
    let runner = runner_with(&spawner, MockLocator::available(&[]), MockProbe::with_duration(10.0));
    let recorder = Recorder::default();

    assert_eq!(runner.run_job(&transcode_job(), &recorder), JobOutcome::Succeeded);

    assert_eq!(recorder.progress(), vec![0.5, 1.0]);
    let statuses = recorder.statuses();
    assert_eq!(statuses.first().map(String::as_str), Some(STATUS_STARTING));
    assert_eq!(statuses.last().map(String::as_str), Some(STATUS_COMPLETE));
    assert!(statuses.iter().any(|s| s.starts_with("Progress: 50.0% | Time: 00:00:05")));

    let logs = recorder.logs();
    assert!(logs[0].starts_with("Command: /mock/bin/ffmpeg -y -hide_banner"));
    assert!(logs.iter().any(|l| l.starts_with("Input #0")));
    assert!(!runner.is_busy());
}

#[test]
fn test_nonzero_exit_fails_with_exit_code() {
    let spawner = MockEngineSpawner::new([MockScript::exiting(
        1,
        "/media/in.mov: No such file or directory\nError opening input file /media/in.mov.\n",
    )]);
    let runner = runner_with(&spawner, MockLocator::available(&[]), MockProbe::default());
    let recorder = Recorder::default();

    assert!(!runner.run(&transcode_job(), &recorder));
    let statuses = recorder.statuses();
    assert!(statuses.iter().any(|s| s.starts_with("Error: Error opening input file")));
    assert_eq!(
        statuses.last().map(String::as_str),
        Some("Conversion failed (exit code 1)")
    );
    assert!(recorder.progress().is_empty());
    assert!(!runner.is_busy());
}

#[test]
fn test_second_job_rejected_while_busy() {
    let hold = Arc::new(AtomicBool::new(true));
    let spawner = MockEngineSpawner::new([MockScript::exiting(0, "").held(hold.clone())]);
    let runner = runner_with(&spawner, MockLocator::available(&[]), MockProbe::with_duration(10.0));

    thread::scope(|scope| {
        let first = scope.spawn(|| runner.run(&transcode_job(), &NoopObserver));
        wait_until(|| spawner.received_calls().len() == 1);
        assert!(runner.is_busy());

        let recorder = Recorder::default();
        assert_eq!(runner.run_job(&transcode_job(), &recorder), JobOutcome::Rejected);
        assert_eq!(recorder.statuses(), vec![STATUS_BUSY]);

        hold.store(false, Ordering::SeqCst);
        assert!(first.join().unwrap());
    });

    assert_eq!(spawner.received_calls().len(), 1);
    assert!(!runner.is_busy());
}

#[test]
fn test_spawn_failure_releases_runner() {
    let spawner = MockEngineSpawner::new([MockScript::spawn_failure(), MockScript::exiting(0, "")]);
    let runner = runner_with(&spawner, MockLocator::available(&[]), MockProbe::with_duration(10.0));
    let recorder = Recorder::default();

    assert!(!runner.run(&transcode_job(), &recorder));
    assert!(recorder.statuses().iter().any(|s| s.starts_with("Error: ")));
    assert!(!runner.is_busy());

    assert!(runner.run(&transcode_job(), &NoopObserver));
}

#[test]
fn test_cancel_terminates_running_process() {
    let hold = Arc::new(AtomicBool::new(true));
    let spawner = MockEngineSpawner::new([MockScript::exiting(0, PROGRESS_HALF).held(hold)]);
    let runner = runner_with(&spawner, MockLocator::available(&[]), MockProbe::with_duration(10.0));
    let recorder = Recorder::default();

    thread::scope(|scope| {
        let job = scope.spawn(|| runner.run_job(&transcode_job(), &recorder));
        wait_until(|| spawner.received_calls().len() == 1);
        runner.cancel();
        assert_eq!(job.join().unwrap(), JobOutcome::Cancelled);
    });

    assert!(spawner.was_terminated(0));
    assert_eq!(
        recorder.statuses().last().map(String::as_str),
        Some(STATUS_CANCELLED)
    );
    assert!(!runner.is_busy());
}

#[test]
fn test_cancel_when_idle_is_a_no_op() {
    let spawner = MockEngineSpawner::new([]);
    let runner = runner_with(&spawner, MockLocator::available(&[]), MockProbe::default());

    runner.cancel();
    assert!(!runner.is_busy());
    assert!(runner.run(&transcode_job(), &NoopObserver));
}

#[test]
fn test_two_stage_gif_remaps_progress_and_removes_palette() {
    let spawner = MockEngineSpawner::new([
        MockScript::exiting(0, format!("{PROGRESS_HALF}{PROGRESS_DONE}")).writing_output(),
        MockScript::exiting(0, format!("{PROGRESS_HALF}{PROGRESS_DONE}")),
    ]);
    let runner = runner_with(&spawner, MockLocator::available(&[]), MockProbe::with_duration(10.0));
    let recorder = Recorder::default();
    let job: JobSpec = GifJobSpec::builder("/media/in.mp4", "/media/out.gif")
        .mode(GifMode::TwoStage)
        .build()
        .unwrap()
        .into();

    assert!(runner.run(&job, &recorder));

    assert_eq!(recorder.progress(), vec![0.25, 0.5, 0.75, 1.0]);
    let calls = spawner.received_calls();
    assert_eq!(calls.len(), 2);
    let palette = PathBuf::from(calls[0].last().unwrap());
    assert!(palette.ends_with("palette.png"));
    assert!(calls[1].contains(&palette.display().to_string()));
    assert!(!palette.exists());
    assert!(!palette.parent().unwrap().exists());

    let statuses = recorder.statuses();
    assert!(statuses.contains(&"Stage 1/2: palette".to_string()));
    assert!(statuses.contains(&"Stage 2/2: gif".to_string()));
}

#[test]
fn test_two_stage_gif_stops_after_failed_palette() {
    let spawner = MockEngineSpawner::new([
        MockScript::exiting(1, "Error while opening encoder\n"),
        MockScript::exiting(0, ""),
    ]);
    let runner = runner_with(&spawner, MockLocator::available(&[]), MockProbe::with_duration(10.0));
    let job: JobSpec = GifJobSpec::builder("/media/in.mp4", "/media/out.gif")
        .mode(GifMode::TwoStage)
        .build()
        .unwrap()
        .into();

    assert!(!runner.run(&job, &NoopObserver));
    assert_eq!(spawner.received_calls().len(), 1);
    assert!(!runner.is_busy());
}

#[test]
fn test_two_stage_gif_failed_apply_still_removes_palette() {
    let spawner = MockEngineSpawner::new([
        MockScript::exiting(0, "").writing_output(),
        MockScript::exiting(1, "Conversion failed!\n"),
    ]);
    let runner = runner_with(&spawner, MockLocator::available(&[]), MockProbe::with_duration(10.0));
    let job: JobSpec = GifJobSpec::builder("/media/in.mp4", "/media/out.gif")
        .mode(GifMode::TwoStage)
        .build()
        .unwrap()
        .into();

    assert!(!runner.run(&job, &NoopObserver));
    let calls = spawner.received_calls();
    assert_eq!(calls.len(), 2);
    assert!(!Path::new(calls[0].last().unwrap()).exists());
}

#[test]
fn test_auto_hwaccel_uses_best_capability() {
    let spawner = MockEngineSpawner::new([MockScript::exiting(0, "")]);
    let runner = runner_with(
        &spawner,
        MockLocator::available(&["vaapi", "cuda"]),
        MockProbe::with_duration(10.0),
    );
    let job: JobSpec = TranscodeJobSpec::builder("/media/in.mov", "/media/out.mp4")
        .hwaccel(HwAccelChoice::Auto)
        .build()
        .unwrap()
        .into();

    assert!(runner.run(&job, &NoopObserver));
    let args = &spawner.received_calls()[0];
    let pos = args.iter().position(|a| a == "-hwaccel").unwrap();
    assert_eq!(args[pos + 1], "cuda");
}

#[test]
fn test_gif_with_unknown_duration_keeps_start_only() {
    let spawner = MockEngineSpawner::new([MockScript::exiting(0, PROGRESS_HALF)]);
    let runner = runner_with(&spawner, MockLocator::available(&[]), MockProbe::default());
    let recorder = Recorder::default();
    let job: JobSpec = GifJobSpec::builder("/media/in.mp4", "/media/out.gif")
        .start(5.0)
        .build()
        .unwrap()
        .into();

    assert!(runner.run(&job, &recorder));
    let args = &spawner.received_calls()[0];
    let pos = args.iter().position(|a| a == "-ss").unwrap();
    assert_eq!(args[pos + 1], "5");
    assert!(!args.iter().any(|a| a == "-t"));
    assert!(recorder.progress().is_empty());
    assert!(recorder.statuses().iter().any(|s| s.starts_with("Time: 00:00:05")));
}

#[test]
fn test_panicking_observer_leaves_runner_idle() {
    let spawner = MockEngineSpawner::new([MockScript::exiting(0, "")]);
    let runner = runner_with(&spawner, MockLocator::available(&[]), MockProbe::with_duration(10.0));

    assert!(!runner.run(&transcode_job(), &PanickingObserver));
    assert!(!runner.is_busy());
    assert!(runner.run(&transcode_job(), &NoopObserver));
}

#[test]
fn test_terminated_exit_code_is_reported_when_not_cancelled() {
    let spawner = MockEngineSpawner::new([MockScript::exiting(TERMINATED_EXIT_CODE, "")]);
    let runner = runner_with(&spawner, MockLocator::available(&[]), MockProbe::with_duration(10.0));
    let recorder = Recorder::default();

    assert_eq!(runner.run_job(&transcode_job(), &recorder), JobOutcome::Failed);
    assert_eq!(
        recorder.statuses().last().map(String::as_str),
        Some("Conversion failed (exit code 255)")
    );
}

#[test]
fn test_cancel_before_spawn_completes_terminates_new_process() {
    let gate = Arc::new(Barrier::new(2));
    let spawner = MockEngineSpawner::new([MockScript::exiting(0, PROGRESS_DONE).gated(gate.clone())]);
    let runner = runner_with(&spawner, MockLocator::available(&[]), MockProbe::with_duration(10.0));
    let recorder = Recorder::default();

    thread::scope(|scope| {
        let job = scope.spawn(|| runner.run_job(&transcode_job(), &recorder));
        gate.wait();
        runner.cancel();
        gate.wait();
        assert_eq!(job.join().unwrap(), JobOutcome::Cancelled);
    });

    assert_eq!(spawner.received_calls().len(), 1);
    assert!(spawner.was_terminated(0));
    let statuses = recorder.statuses();
    assert_eq!(statuses.last().map(String::as_str), Some(STATUS_CANCELLED));
    assert!(!statuses.iter().any(|s| s == STATUS_COMPLETE));
    assert!(!runner.is_busy());
}

#[test]
fn test_cancel_during_palette_stage_skips_apply_stage() {
    let gate = Arc::new(Barrier::new(2));
    let spawner = MockEngineSpawner::new([
        MockScript::exiting(0, PROGRESS_HALF).gated(gate.clone()),
        MockScript::exiting(0, PROGRESS_DONE),
    ]);
    let runner = runner_with(&spawner, MockLocator::available(&[]), MockProbe::with_duration(10.0));
    let recorder = Recorder::default();
    let job: JobSpec = GifJobSpec::builder("/media/in.mp4", "/media/out.gif")
        .mode(GifMode::TwoStage)
        .build()
        .unwrap()
        .into();

    thread::scope(|scope| {
        let handle = scope.spawn(|| runner.run_job(&job, &recorder));
        gate.wait();
        runner.cancel();
        gate.wait();
        assert_eq!(handle.join().unwrap(), JobOutcome::Cancelled);
    });

    let calls = spawner.received_calls();
    assert_eq!(calls.len(), 1);
    assert!(!Path::new(calls[0].last().unwrap()).parent().unwrap().exists());
    let statuses = recorder.statuses();
    assert!(statuses.contains(&"Stage 1/2: palette".to_string()));
    assert!(!statuses.contains(&"Stage 2/2: gif".to_string()));
    assert_eq!(statuses.last().map(String::as_str), Some(STATUS_CANCELLED));
}

#[test]
fn test_stale_cancel_does_not_affect_next_job() {
    let spawner = MockEngineSpawner::new([]);
    let runner = runner_with(&spawner, MockLocator::available(&[]), MockProbe::default());

    // Left behind by a cancel that lost the race with the previous job's cleanup.
    runner.cancel_requested.store(true, Ordering::SeqCst);

    assert_eq!(runner.run_job(&transcode_job(), &NoopObserver), JobOutcome::Succeeded);
    assert_eq!(spawner.received_calls().len(), 1);
    assert!(!spawner.was_terminated(0));
}

#[test]
fn test_cancel_racing_job_end_does_not_leak_into_next_job() {
    for _ in 0..200 {
        let spawner = MockEngineSpawner::new([]);
        let runner = runner_with(&spawner, MockLocator::available(&[]), MockProbe::default());
        let finished = AtomicBool::new(false);

        thread::scope(|scope| {
            scope.spawn(|| {
                while !finished.load(Ordering::SeqCst) {
                    runner.cancel();
                }
            });
            runner.run_job(&transcode_job(), &NoopObserver);
            finished.store(true, Ordering::SeqCst);
        });

        assert_eq!(runner.run_job(&transcode_job(), &NoopObserver), JobOutcome::Succeeded);
    }
}

#[test]
fn test_monitor_read_error_is_reported_and_exit_code_decides() {
    let spawner = MockEngineSpawner::new([
        MockScript::exiting(0, PROGRESS_HALF).failing_stderr("pipe closed"),
        MockScript::exiting(1, PROGRESS_HALF).failing_stderr("pipe closed"),
    ]);
    let runner = runner_with(&spawner, MockLocator::available(&[]), MockProbe::with_duration(10.0));

    let recorder = Recorder::default();
    assert_eq!(runner.run_job(&transcode_job(), &recorder), JobOutcome::Succeeded);
    assert_eq!(recorder.progress(), vec![0.5]);
    let statuses = recorder.statuses();
    assert!(statuses.contains(&"Monitor error: pipe closed".to_string()));
    assert_eq!(statuses.last().map(String::as_str), Some(STATUS_COMPLETE));

    let recorder = Recorder::default();
    assert_eq!(runner.run_job(&transcode_job(), &recorder), JobOutcome::Failed);
    let statuses = recorder.statuses();
    assert!(statuses.contains(&"Monitor error: pipe closed".to_string()));
    assert_eq!(
        statuses.last().map(String::as_str),
        Some("Conversion failed (exit code 1)")
    );
    assert!(!runner.is_busy());
}

#[test]
fn test_wait_failure_terminates_process_and_fails_job() {
    let spawner = MockEngineSpawner::new([MockScript::exiting(0, "").failing_wait()]);
    let runner = runner_with(&spawner, MockLocator::available(&[]), MockProbe::with_duration(10.0));
    let recorder = Recorder::default();

    assert_eq!(runner.run_job(&transcode_job(), &recorder), JobOutcome::Failed);
    assert!(spawner.was_terminated(0));
    assert!(recorder.statuses().iter().any(|s| s.contains("mock wait failure")));
    assert!(!runner.is_busy());
}
