//! Integration tests: the real tool runner against a fake tool script.

#![cfg(unix)]

mod common;

use std::time::Duration;

use adq_core::job::JobId;
use adq_core::runner::{
    JobEvent, JobReporter, JobRunner, JobTicket, JobUpdate, Quality, RunSettings, RunnerError,
    ToolRunner,
};
use common::fake_tool::{fake_tool, script_dir};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn ticket(url: &str) -> JobTicket {
    JobTicket {
        id: JobId(1),
        url: url.to_string(),
    }
}

fn settings() -> RunSettings {
    RunSettings::new(script_dir(), Quality::Low)
}

fn reporter() -> (JobReporter, mpsc::UnboundedReceiver<JobEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (JobReporter::new(JobId(1), tx), rx)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<JobEvent>) -> Vec<JobUpdate> {
    let mut updates = Vec::new();
    while let Ok(event) = rx.try_recv() {
        assert_eq!(event.job_id, JobId(1));
        updates.push(event.update);
    }
    updates
}

#[tokio::test]
async fn successful_run_streams_progress_and_status() {
    let runner = ToolRunner::new(fake_tool());
    let (reporter, mut rx) = reporter();
    let cancel = CancellationToken::new();

    runner
        .run(&ticket("https://example.com/ok"), &settings(), &reporter, &cancel)
        .await
        .expect("run succeeds");

    let updates = drain(&mut rx);
    let progress: Vec<f64> = updates
        .iter()
        .filter_map(|u| match u {
            JobUpdate::Progress(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![10.0, 55.5, 75.0, 100.0]);
    assert!(updates.contains(&JobUpdate::Status(
        "[ExtractAudio] Destination: song.mp3".to_string()
    )));
    assert!(updates.contains(&JobUpdate::Status(
        "[download] Destination: track.webm".to_string()
    )));
}

#[tokio::test]
async fn non_zero_exit_reports_last_error_line() {
    let runner = ToolRunner::new(fake_tool());
    let (reporter, _rx) = reporter();
    let cancel = CancellationToken::new();

    let err = runner
        .run(&ticket("https://example.com/fail"), &settings(), &reporter, &cancel)
        .await
        .unwrap_err();
    match err {
        RunnerError::ToolExit { code, message } => {
            assert_eq!(code, Some(3));
            assert_eq!(message, "ERROR: Video unavailable");
        }
        other => panic!("expected ToolExit, got {other:?}"),
    }
}

#[tokio::test]
async fn non_zero_exit_without_error_line_is_generic() {
    let runner = ToolRunner::new(fake_tool());
    let (reporter, _rx) = reporter();
    let cancel = CancellationToken::new();

    let err = runner
        .run(
            &ticket("https://example.com/silent-exit"),
            &settings(),
            &reporter,
            &cancel,
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "tool exited with code 4");
}

#[tokio::test]
async fn missing_tool_is_spawn_error() {
    let missing = script_dir().join("no-such-tool");
    let runner = ToolRunner::new(&missing);
    let (reporter, _rx) = reporter();
    let cancel = CancellationToken::new();

    let err = runner
        .run(&ticket("https://example.com/ok"), &settings(), &reporter, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, RunnerError::Spawn { .. }), "got {err:?}");
}

#[tokio::test]
async fn cancelled_before_spawn_never_starts() {
    let runner = ToolRunner::new(fake_tool());
    let (reporter, mut rx) = reporter();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = runner
        .run(&ticket("https://example.com/ok"), &settings(), &reporter, &cancel)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn cancellation_kills_running_tool() {
    let runner = ToolRunner::new(fake_tool());
    let (reporter, mut rx) = reporter();
    let cancel = CancellationToken::new();

    let run = {
        let cancel = cancel.clone();
        let settings = settings();
        tokio::spawn(async move {
            runner
                .run(&ticket("https://example.com/hang"), &settings, &reporter, &cancel)
                .await
        })
    };

    let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("tool printed progress")
        .expect("reporter alive");
    assert_eq!(first.update, JobUpdate::Progress(1.0));

    cancel.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("runner returned promptly after cancel")
        .unwrap();
    assert!(matches!(result, Err(RunnerError::Cancelled)));
}

/// True once `pid` no longer exists or is a zombie awaiting reaping.
#[cfg(target_os = "linux")]
fn process_is_dead(pid: u32) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Err(_) => true,
        Ok(stat) => stat
            .rsplit_once(") ")
            .map_or(false, |(_, rest)| rest.starts_with('Z')),
    }
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn cancellation_kills_the_whole_process_tree() {
    let runner = ToolRunner::new(fake_tool());
    let (reporter, mut rx) = reporter();
    let cancel = CancellationToken::new();

    let run = {
        let cancel = cancel.clone();
        let settings = settings();
        tokio::spawn(async move {
            runner
                .run(&ticket("https://example.com/tree"), &settings, &reporter, &cancel)
                .await
        })
    };

    let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("tool printed progress")
        .expect("reporter alive");
    assert_eq!(first.update, JobUpdate::Progress(2.0));
    let child_pid: u32 = std::fs::read_to_string(script_dir().join("tree.pid"))
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    assert!(!process_is_dead(child_pid));

    cancel.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("runner returned promptly after cancel")
        .unwrap();
    assert!(matches!(result, Err(RunnerError::Cancelled)));

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while !process_is_dead(child_pid) {
        assert!(
            std::time::Instant::now() < deadline,
            "background child {child_pid} survived cancellation"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn tool_receives_expected_arguments() {
    let runner = ToolRunner::new(fake_tool());
    let (reporter, _rx) = reporter();
    let cancel = CancellationToken::new();

    runner
        .run(&ticket("https://example.com/args"), &settings(), &reporter, &cancel)
        .await
        .unwrap();

    let recorded = std::fs::read_to_string(script_dir().join("args.txt")).unwrap();
    let args: Vec<&str> = recorded.lines().collect();
    let template = script_dir().join("%(title)s.%(ext)s");
    assert_eq!(
        args,
        vec![
            "--newline",
            "--no-playlist",
            "-x",
            "--audio-format",
            "mp3",
            "--audio-quality",
            "9",
            "-o",
            template.to_str().unwrap(),
            "https://example.com/args",
        ]
    );
}
