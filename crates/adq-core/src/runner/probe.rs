//! Checks that the extraction tool and ffmpeg can be started.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Result of asking one external binary for its version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolProbe {
    pub name: &'static str,
    pub program: String,
    /// First line of the version output, if the binary answered.
    pub version: Option<String>,
    pub error: Option<String>,
}

impl ToolProbe {
    pub fn is_available(&self) -> bool {
        self.version.is_some()
    }
}

/// Probes the configured tool (`--version`) and `ffmpeg` (`-version`).
pub async fn probe_tools(tool_path: &Path) -> Vec<ToolProbe> {
    vec![
        probe_one("tool", &tool_path.display().to_string(), "--version").await,
        probe_one("ffmpeg", "ffmpeg", "-version").await,
    ]
}

async fn probe_one(name: &'static str, program: &str, flag: &str) -> ToolProbe {
    let output = Command::new(program)
        .arg(flag)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await;

    let (version, error) = match output {
        Ok(out) if out.status.success() => {
            let text = String::from_utf8_lossy(&out.stdout);
            let first = text.lines().next().unwrap_or("").trim().to_string();
            (Some(first), None)
        }
        Ok(out) => (None, Some(format!("exited with {}", out.status))),
        Err(e) => (None, Some(e.to_string())),
    };
    tracing::debug!(name, program, ?version, ?error, "tool probe");

    ToolProbe {
        name,
        program: program.to_string(),
        version,
        error,
    }
}
