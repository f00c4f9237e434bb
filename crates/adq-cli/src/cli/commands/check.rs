//! `adq check` – verify the external binaries a batch depends on.

use adq_core::config::{self, AdqConfig};
use adq_core::logging;
use adq_core::runner::probe_tools;
use anyhow::{bail, Result};
use std::path::Path;

pub async fn run_check(cfg: &AdqConfig) -> Result<()> {
    let probes = probe_tools(Path::new(&cfg.tool_path)).await;
    let mut missing = 0;
    for probe in &probes {
        match (&probe.version, &probe.error) {
            (Some(version), _) => println!("{:<8} ok       {} ({})", probe.name, probe.program, version),
            (None, err) => {
                missing += 1;
                println!(
                    "{:<8} missing  {} ({})",
                    probe.name,
                    probe.program,
                    err.as_deref().unwrap_or("no output")
                );
            }
        }
    }
    if let Ok(path) = config::config_path() {
        println!("config   {}", path.display());
    }
    if let Ok(path) = logging::log_file_path() {
        println!("log      {}", path.display());
    }

    if missing > 0 {
        bail!("{missing} required tool(s) unavailable");
    }
    Ok(())
}
