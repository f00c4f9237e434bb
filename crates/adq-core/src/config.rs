use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::runner::{Quality, RunSettings, DEFAULT_AUDIO_FORMAT};
use crate::scheduler::DEFAULT_CAPACITY;

/// Global configuration loaded from `~/.config/adq/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdqConfig {
    /// Extraction tool executable, looked up on PATH unless absolute.
    pub tool_path: String,
    /// Where audio files are written; the CLI falls back to the current directory.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Default audio quality: "high", "medium" or "low".
    #[serde(default)]
    pub quality: Quality,
    /// Maximum jobs downloading at once.
    #[serde(default = "default_capacity")]
    pub max_concurrent_jobs: usize,
    /// Target audio codec passed to the tool.
    #[serde(default = "default_audio_format")]
    pub audio_format: String,
    /// Extra tool arguments, placed before the URL.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_audio_format() -> String {
    DEFAULT_AUDIO_FORMAT.to_string()
}

impl Default for AdqConfig {
    fn default() -> Self {
        Self {
            tool_path: "yt-dlp".to_string(),
            output_dir: None,
            quality: Quality::default(),
            max_concurrent_jobs: DEFAULT_CAPACITY,
            audio_format: default_audio_format(),
            extra_args: Vec::new(),
        }
    }
}

impl AdqConfig {
    /// Pool size, never below one.
    pub fn capacity(&self) -> usize {
        self.max_concurrent_jobs.max(1)
    }

    /// Batch run settings for the given output directory.
    pub fn run_settings(&self, output_dir: PathBuf) -> RunSettings {
        let mut settings = RunSettings::new(output_dir, self.quality);
        settings.audio_format = self.audio_format.clone();
        settings.extra_args = self.extra_args.clone();
        settings
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("adq")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<AdqConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = AdqConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: AdqConfig = toml::from_str(&data)?;
    Ok(cfg)
}
