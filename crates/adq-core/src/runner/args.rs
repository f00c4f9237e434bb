//! Tool invocation: quality mapping and argument vector.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::str::FromStr;

use super::RunSettings;

/// Output file name template, relative to the output directory.
pub const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

pub const DEFAULT_AUDIO_FORMAT: &str = "mp3";

/// Audio quality requested from the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    High,
    Medium,
    Low,
}

impl Quality {
    /// Value on the tool's 0 (best) to 9 (worst) scale.
    pub fn tool_value(self) -> u8 {
        match self {
            Quality::High => 0,
            Quality::Medium => 5,
            Quality::Low => 9,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Quality::High => "high",
            Quality::Medium => "medium",
            Quality::Low => "low",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "best" => Ok(Quality::High),
            "medium" | "mid" => Ok(Quality::Medium),
            "low" | "worst" => Ok(Quality::Low),
            other => Err(format!(
                "unknown quality '{other}' (expected high, medium or low)"
            )),
        }
    }
}

/// Builds the tool's argument vector; the URL is always last.
pub fn build_args(url: &str, settings: &RunSettings) -> Vec<OsString> {
    let template = settings.output_dir.join(OUTPUT_TEMPLATE);
    let mut args: Vec<OsString> = vec![
        "--newline".into(),
        "--no-playlist".into(),
        "-x".into(),
        "--audio-format".into(),
        settings.audio_format.clone().into(),
        "--audio-quality".into(),
        settings.quality.tool_value().to_string().into(),
        "-o".into(),
        template.into_os_string(),
    ];
    args.extend(settings.extra_args.iter().map(OsString::from));
    args.push(url.into());
    args
}
