//! `adq stop` – signal a running `adq run` to cancel its batch.

use anyhow::Result;

#[cfg(unix)]
pub async fn run_stop() -> Result<()> {
    use crate::cli::control_socket;

    let path = adq_core::control::default_control_socket_path()?;
    if control_socket::send_stop(&path).await? {
        println!("Stop requested");
    } else {
        println!("No running batch.");
    }
    Ok(())
}

#[cfg(not(unix))]
pub async fn run_stop() -> Result<()> {
    anyhow::bail!("`adq stop` needs a unix control socket; press Ctrl-C in the running batch instead")
}
