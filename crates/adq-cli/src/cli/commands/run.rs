//! `adq run` – download a batch of URLs and report per-job results.

use adq_core::config::AdqConfig;
use adq_core::job::JobState;
use adq_core::runner::{Quality, ToolRunner};
use adq_core::scheduler::{BatchSnapshot, BatchSummary, Scheduler};
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Options from the command line; `None` falls back to the config file.
#[derive(Debug, Default)]
pub struct RunOptions {
    pub urls: Vec<String>,
    pub file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub quality: Option<Quality>,
    pub jobs: Option<usize>,
}

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

pub async fn run_batch(cfg: &AdqConfig, opts: RunOptions) -> Result<()> {
    let mut urls = opts.urls;
    if let Some(path) = &opts.file {
        urls.extend(read_url_file(path)?);
    }
    if urls.is_empty() {
        bail!("no URLs given (pass them as arguments or with --file)");
    }

    let output_dir = match opts.output_dir.or_else(|| cfg.output_dir.clone()) {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("create output directory {}", output_dir.display()))?;

    let mut settings = cfg.run_settings(output_dir.clone());
    if let Some(quality) = opts.quality {
        settings.quality = quality;
    }
    let capacity = opts.jobs.unwrap_or_else(|| cfg.capacity());
    let runner = Arc::new(ToolRunner::from_config(cfg));
    let scheduler = Scheduler::with_capacity(runner, settings, capacity);

    let report = scheduler.submit(&urls);
    for url in &report.duplicates {
        println!("skipping duplicate: {url}");
    }
    for url in &report.rejected {
        println!("skipping invalid URL: {url}");
    }
    if report.added.is_empty() {
        bail!("no valid URLs to download");
    }
    println!(
        "Downloading {} URL(s) to {} ({} at a time)",
        report.added.len(),
        output_dir.display(),
        scheduler.capacity()
    );

    let progress_handle = tokio::spawn(print_progress(scheduler.subscribe()));

    let interrupt_handle = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() && scheduler.stop() {
                println!("\nStopping; running downloads are being terminated...");
            }
        })
    };

    let control = spawn_control(&scheduler);

    let summary = scheduler.start().await?;

    interrupt_handle.abort();
    if let Some((handle, path)) = control {
        handle.abort();
        let _ = std::fs::remove_file(path);
    }
    let _ = progress_handle.await;

    print_results(&scheduler, &summary);
    tracing::info!(
        state = %summary.state,
        completed = summary.completed,
        failed = summary.failed,
        stopped = summary.stopped,
        "run finished"
    );

    if summary.failed > 0 {
        bail!("{} of {} download(s) failed", summary.failed, summary.total);
    }
    Ok(())
}

#[cfg(unix)]
fn spawn_control(scheduler: &Scheduler) -> Option<(tokio::task::JoinHandle<()>, PathBuf)> {
    use crate::cli::control_socket;

    let path = adq_core::control::default_control_socket_path().ok()?;
    match control_socket::spawn_control_listener(scheduler.clone(), &path) {
        Ok(handle) => {
            tracing::debug!(path = %path.display(), "control socket listening");
            Some((handle, path))
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), "control socket unavailable: {:#}", e);
            None
        }
    }
}

#[cfg(not(unix))]
fn spawn_control(_scheduler: &Scheduler) -> Option<(tokio::task::JoinHandle<()>, PathBuf)> {
    None
}

/// Reads one URL per line, skipping blanks and `#` comments.
pub(crate) fn read_url_file(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read URL file {}", path.display()))?;
    Ok(parse_url_lines(&text))
}

pub(crate) fn parse_url_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

async fn print_progress(mut rx: watch::Receiver<BatchSnapshot>) {
    let mut last_print: Option<Instant> = None;
    while rx.changed().await.is_ok() {
        let snapshot = rx.borrow_and_update().clone();
        let terminal = snapshot.state.is_terminal();
        let due = last_print.map_or(true, |t| t.elapsed() >= PROGRESS_INTERVAL);
        if due || terminal {
            println!("{}", progress_line(&snapshot));
            last_print = Some(Instant::now());
        }
        if terminal {
            break;
        }
    }
}

pub(crate) fn progress_line(snapshot: &BatchSnapshot) -> String {
    let stats = &snapshot.stats;
    format!(
        "  [{}/{}] {:.1}%  active {}  elapsed {}s",
        stats.processed_count,
        stats.total_count,
        stats.overall_progress,
        snapshot.count_in(JobState::Downloading),
        stats.elapsed.as_secs()
    )
}

fn print_results(scheduler: &Scheduler, summary: &BatchSummary) {
    println!();
    println!("{:<6} {:<12} {:>8}  {}", "ID", "STATE", "PROGRESS", "URL");
    for job in scheduler.jobs() {
        println!(
            "{:<6} {:<12} {:>7.1}%  {}",
            job.id(),
            job.state(),
            job.effective_progress(),
            job.url()
        );
    }

    let errors = scheduler.error_log();
    if !errors.is_empty() {
        println!();
        println!("Errors:");
        for entry in errors {
            println!(
                "  {} job {} {}: {}",
                entry.at.format("%H:%M:%S"),
                entry.job_id,
                entry.url,
                entry.message
            );
        }
    }

    println!();
    println!(
        "Batch {}: {} completed, {} failed, {} stopped in {:.1}s",
        summary.state,
        summary.completed,
        summary.failed,
        summary.stopped,
        summary.elapsed.as_secs_f64()
    );
}
