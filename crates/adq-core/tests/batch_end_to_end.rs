//! Integration tests: scheduler + tool runner against the fake tool script.

#![cfg(unix)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use adq_core::job::JobState;
use adq_core::runner::{Quality, RunSettings, ToolRunner};
use adq_core::scheduler::{BatchState, Scheduler};
use common::fake_tool::{fake_tool, script_dir};

fn scheduler() -> Scheduler {
    let runner = Arc::new(ToolRunner::new(fake_tool()));
    Scheduler::new(runner, RunSettings::new(script_dir(), Quality::High))
}

#[tokio::test]
async fn five_urls_all_complete() {
    let sched = scheduler();
    let urls: Vec<String> = (1..=5)
        .map(|i| format!("https://example.com/ok-{i}"))
        .collect();
    assert_eq!(sched.submit(&urls).added.len(), 5);

    let summary = sched.start().await.expect("batch runs");
    assert_eq!(summary.state, BatchState::Completed);
    assert_eq!(summary.total, 5);
    assert_eq!(summary.processed, 5);
    assert_eq!(summary.completed, 5);

    let stats = sched.stats();
    assert_eq!(stats.overall_progress, 100.0);
    for job in sched.jobs() {
        assert_eq!(job.state(), JobState::Completed);
        assert_eq!(job.progress(), 100.0);
    }
}

#[tokio::test]
async fn failing_url_does_not_abort_siblings() {
    let sched = scheduler();
    let ids = sched
        .submit([
            "https://example.com/ok-a",
            "https://example.com/fail-b",
            "https://example.com/ok-c",
        ])
        .added;

    let summary = sched.start().await.unwrap();
    assert_eq!(summary.completed, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.processed, 3);

    let failed = sched.job(ids[1]).unwrap();
    assert_eq!(failed.state(), JobState::Failed);
    assert_eq!(failed.error_message(), "ERROR: Video unavailable");
    assert_eq!(sched.error_log().len(), 1);
}

#[tokio::test]
async fn missing_tool_fails_each_job_with_spawn_message() {
    let runner = Arc::new(ToolRunner::new(script_dir().join("absent-tool")));
    let sched = Scheduler::new(runner, RunSettings::new(script_dir(), Quality::High));
    sched.submit(["https://example.com/ok-1", "https://example.com/ok-2"]);

    let summary = sched.start().await.unwrap();
    assert_eq!(summary.state, BatchState::Completed);
    assert_eq!(summary.failed, 2);
    for entry in sched.error_log() {
        assert!(entry.message.contains("could not start"), "{}", entry.message);
    }
}

#[tokio::test]
async fn stop_mid_batch_kills_tools_and_stops_queue() {
    let sched = scheduler();
    let urls: Vec<String> = (1..=4)
        .map(|i| format!("https://example.com/hang-{i}"))
        .collect();
    sched.submit(&urls);

    let handle = {
        let sched = sched.clone();
        tokio::spawn(async move { sched.start().await })
    };

    let mut rx = sched.subscribe();
    tokio::time::timeout(
        Duration::from_secs(10),
        rx.wait_for(|s| {
            s.jobs
                .iter()
                .filter(|j| j.state() == JobState::Downloading && j.progress() > 0.0)
                .count()
                == 3
        }),
    )
    .await
    .expect("three tools reported progress")
    .unwrap();

    assert!(sched.stop());
    let summary = tokio::time::timeout(Duration::from_secs(10), handle)
        .await
        .expect("batch settled promptly")
        .unwrap()
        .unwrap();

    assert_eq!(summary.state, BatchState::Cancelled);
    assert_eq!(summary.processed, 4);
    assert_eq!(summary.stopped, 4);
    for job in sched.jobs() {
        assert_eq!(job.state(), JobState::Stopped);
        assert_eq!(job.progress(), 0.0);
    }
}
