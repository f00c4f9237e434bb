//! Tests for `adq run` parsing and its helpers.

use super::parse;
use crate::cli::commands::{parse_url_lines, progress_line};
use crate::cli::{Cli, CliCommand};
use adq_core::runner::{Quality, RunSettings, ToolRunner};
use adq_core::scheduler::Scheduler;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[test]
fn cli_parse_run_urls() {
    match parse(&["adq", "run", "https://a.example/1", "https://b.example/2"]) {
        CliCommand::Run {
            urls,
            file,
            output_dir,
            quality,
            jobs,
        } => {
            assert_eq!(urls, vec!["https://a.example/1", "https://b.example/2"]);
            assert!(file.is_none());
            assert!(output_dir.is_none());
            assert!(quality.is_none());
            assert!(jobs.is_none());
        }
        _ => panic!("expected Run"),
    }
}

#[test]
fn cli_parse_run_options() {
    match parse(&[
        "adq",
        "run",
        "--file",
        "urls.txt",
        "-o",
        "/tmp/music",
        "--quality",
        "low",
        "-j",
        "5",
    ]) {
        CliCommand::Run {
            urls,
            file,
            output_dir,
            quality,
            jobs,
        } => {
            assert!(urls.is_empty());
            assert_eq!(file, Some(PathBuf::from("urls.txt")));
            assert_eq!(output_dir, Some(PathBuf::from("/tmp/music")));
            assert_eq!(quality, Some(Quality::Low));
            assert_eq!(jobs, Some(5));
        }
        _ => panic!("expected Run with options"),
    }
}

#[test]
fn cli_parse_run_quality_aliases() {
    match parse(&["adq", "run", "-q", "best", "https://a.example/1"]) {
        CliCommand::Run { quality, .. } => assert_eq!(quality, Some(Quality::High)),
        _ => panic!("expected Run"),
    }
}

#[test]
fn cli_rejects_unknown_quality() {
    assert!(Cli::try_parse_from(["adq", "run", "-q", "lossless"]).is_err());
}

#[test]
fn cli_rejects_zero_jobs() {
    assert!(Cli::try_parse_from(["adq", "run", "--jobs", "0"]).is_err());
}

#[test]
fn url_file_skips_blanks_and_comments() {
    let text = "\n# favourites\nhttps://a.example/1\n   \n  https://b.example/2  \n#https://c.example/3\n";
    assert_eq!(
        parse_url_lines(text),
        vec!["https://a.example/1", "https://b.example/2"]
    );
}

#[test]
fn progress_line_shows_counts_and_percent() {
    let scheduler = Scheduler::new(
        Arc::new(ToolRunner::new("yt-dlp")),
        RunSettings::new("/tmp", Quality::High),
    );
    scheduler.submit(["https://a.example/1", "https://a.example/2"]);
    let line = progress_line(&scheduler.snapshot());
    assert!(line.contains("[0/0]"), "{line}");
    assert!(line.contains("0.0%"), "{line}");
    assert!(line.contains("active 0"), "{line}");
}
