//! CLI for the ADQ audio download queue.

mod commands;
#[cfg(unix)]
mod control_socket;

use adq_core::config;
use adq_core::runner::Quality;
use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use commands::{run_batch, run_check, run_completions, run_stop, RunOptions};

/// Top-level CLI for the ADQ audio download queue.
#[derive(Debug, Parser)]
#[command(name = "adq")]
#[command(about = "ADQ: concurrent audio download queue driven by yt-dlp", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download the given URLs as audio, a few at a time.
    Run {
        /// Media page URLs (http or https).
        urls: Vec<String>,

        /// Read additional URLs from a file, one per line. Blank lines and `#` comments are skipped.
        #[arg(long, short = 'f', value_name = "PATH")]
        file: Option<PathBuf>,

        /// Directory the audio files are written to (default: config value, then current directory).
        #[arg(long, short = 'o', value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Audio quality: high, medium or low.
        #[arg(long, short = 'q', value_name = "QUALITY")]
        quality: Option<Quality>,

        /// Run up to N downloads at once (default: config value, 3).
        #[arg(long, short = 'j', value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
        jobs: Option<u16>,
    },

    /// Ask a running `adq run` to stop its batch.
    Stop,

    /// Check that the download tool and ffmpeg can be started.
    Check,

    /// Print shell completions to stdout.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Run {
                urls,
                file,
                output_dir,
                quality,
                jobs,
            } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                let opts = RunOptions {
                    urls,
                    file,
                    output_dir,
                    quality,
                    jobs: jobs.map(usize::from),
                };
                run_batch(&cfg, opts).await?;
            }
            CliCommand::Stop => run_stop().await?,
            CliCommand::Check => {
                let cfg = config::load_or_init()?;
                run_check(&cfg).await?;
            }
            CliCommand::Completions { shell } => run_completions(shell),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
