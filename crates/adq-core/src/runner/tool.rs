//! Runner that drives the external extraction tool as a subprocess.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::config::AdqConfig;
use crate::line_parser::parse_line;

use super::args::build_args;
use super::terminate::terminate_tree;
use super::{JobReporter, JobRunner, JobTicket, RunSettings, RunnerError};

/// Runs each job as one invocation of the extraction tool.
#[derive(Debug, Clone)]
pub struct ToolRunner {
    program: PathBuf,
}

impl ToolRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_config(cfg: &AdqConfig) -> Self {
        Self::new(&cfg.tool_path)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait]
impl JobRunner for ToolRunner {
    async fn run(
        &self,
        job: &JobTicket,
        settings: &RunSettings,
        reporter: &JobReporter,
        cancel: &CancellationToken,
    ) -> Result<(), RunnerError> {
        if cancel.is_cancelled() {
            return Err(RunnerError::Cancelled);
        }

        let args = build_args(&job.url, settings);
        tracing::debug!(job_id = %job.id, program = %self.program.display(), ?args, "spawning tool");

        let mut cmd = Command::new(&self.program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so the tool and its ffmpeg child die together.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|source| RunnerError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let last_error = Mutex::new(None);

        let drained = {
            let pumps = async {
                tokio::join!(
                    pump_lines(stdout, "stdout", reporter, &last_error),
                    pump_lines(stderr, "stderr", reporter, &last_error),
                )
            };
            tokio::select! {
                biased;
                _ = cancel.cancelled() => false,
                _ = pumps => true,
            }
        };
        if !drained {
            terminate_tree(&mut child).await;
            return Err(RunnerError::Cancelled);
        }

        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                terminate_tree(&mut child).await;
                return Err(RunnerError::Cancelled);
            }
            status = child.wait() => status?,
        };

        if status.success() {
            return Ok(());
        }
        Err(RunnerError::tool_exit(status.code(), last_error.into_inner()))
    }
}

/// Reads one output stream to EOF, forwarding parsed facets.
///
/// Splits on `\n` and `\r` so carriage-return progress redraws are seen too.
/// Bytes are decoded lossily; a read error ends this stream only.
async fn pump_lines<R>(
    stream: Option<R>,
    name: &'static str,
    reporter: &JobReporter,
    last_error: &Mutex<Option<String>>,
) where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return;
    };
    let mut segments = BufReader::new(stream).split(b'\n');
    loop {
        match segments.next_segment().await {
            Ok(Some(bytes)) => {
                let text = String::from_utf8_lossy(&bytes);
                for line in text.split('\r') {
                    handle_line(line, name, reporter, last_error);
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(job_id = %reporter.job_id(), stream = name, "reading tool output: {}", e);
                break;
            }
        }
    }
}

fn handle_line(
    line: &str,
    name: &'static str,
    reporter: &JobReporter,
    last_error: &Mutex<Option<String>>,
) {
    let parsed = parse_line(line);
    if parsed.is_empty() {
        return;
    }
    tracing::debug!(job_id = %reporter.job_id(), stream = name, line = line.trim(), "tool output");
    if let Some(percent) = parsed.progress {
        reporter.progress(percent);
    }
    if let Some(status) = parsed.status {
        reporter.status(status);
    }
    if let Some(error) = parsed.error {
        *last_error.lock() = Some(error);
    }
}
