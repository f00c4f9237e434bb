//! Control socket: server (during `adq run`) and client (for `adq stop`).
//! Protocol: one command per line, currently only "stop".

use adq_core::control::{parse_control_line, ControlCommand};
use adq_core::scheduler::Scheduler;
use anyhow::Result;
use std::io::ErrorKind;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::task::JoinHandle;

/// Binds `path` and spawns a task that stops `scheduler` on every "stop" line.
/// Unknown lines are ignored.
pub fn spawn_control_listener(scheduler: Scheduler, path: impl AsRef<Path>) -> Result<JoinHandle<()>> {
    let path = path.as_ref();
    let _ = std::fs::remove_file(path);
    let listener = UnixListener::bind(path)?;

    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let scheduler = scheduler.clone();
                    tokio::spawn(async move {
                        let mut reader = BufReader::new(stream).lines();
                        while let Ok(Some(line)) = reader.next_line().await {
                            match parse_control_line(&line) {
                                Some(ControlCommand::Stop) => {
                                    let accepted = scheduler.stop();
                                    tracing::info!(accepted, "stop requested over control socket");
                                }
                                None => tracing::debug!(line = %line.trim(), "ignored control line"),
                            }
                        }
                    });
                }
                Err(e) => tracing::debug!("control socket accept: {}", e),
            }
        }
    });
    Ok(handle)
}

/// Sends "stop" to the control socket. Returns `false` when no batch is listening.
pub async fn send_stop(socket_path: &Path) -> Result<bool> {
    if !socket_path.exists() {
        return Ok(false);
    }
    let mut stream = match UnixStream::connect(socket_path).await {
        Ok(stream) => stream,
        // Leftover socket file from a batch that exited without cleanup.
        Err(e) if matches!(e.kind(), ErrorKind::ConnectionRefused | ErrorKind::NotFound) => {
            return Ok(false)
        }
        Err(e) => return Err(e.into()),
    };
    stream.write_all(ControlCommand::Stop.as_line().as_bytes()).await?;
    stream.shutdown().await?;
    Ok(true)
}
