//! Best-effort classification of the extraction tool's output lines.
//!
//! Anything unrecognized is "no update", never an error: the tool's output is
//! unstructured text and its format drifts between releases.

use regex::Regex;
use std::sync::LazyLock;

use crate::job::clamp_percent;

/// Stage markers the tool prefixes its status lines with.
const STAGE_MARKERS: &[&str] = &["[download]", "[ExtractAudio]", "[ffmpeg]"];

static PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+(?:\.[0-9]+)?)%").expect("percent regex is valid"));

/// Facets detected in one output line. A line may carry all three at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLine {
    /// Percentage found anywhere in the line, clamped to `[0, 100]`.
    pub progress: Option<f64>,
    /// Full trimmed line, when it starts with a stage marker.
    pub status: Option<String>,
    /// Full trimmed line, when it mentions "error" in any case.
    pub error: Option<String>,
}

impl ParsedLine {
    pub fn is_empty(&self) -> bool {
        self.progress.is_none() && self.status.is_none() && self.error.is_none()
    }
}

/// Classifies a single raw line. Blank lines yield an empty result.
pub fn parse_line(line: &str) -> ParsedLine {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ParsedLine::default();
    }

    let progress = PERCENT_RE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(clamp_percent);

    let status = STAGE_MARKERS
        .iter()
        .any(|marker| trimmed.starts_with(marker))
        .then(|| trimmed.to_string());

    let error = trimmed
        .to_ascii_lowercase()
        .contains("error")
        .then(|| trimmed.to_string());

    ParsedLine {
        progress,
        status,
        error,
    }
}
