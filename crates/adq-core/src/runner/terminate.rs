//! Process-tree termination on cancellation. Failures are logged, never raised.

use tokio::process::Child;

/// Kills the child and everything it spawned, then reaps it.
pub(super) async fn terminate_tree(child: &mut Child) {
    if let Some(pid) = child.id() {
        kill_process_tree(pid).await;
    }
    // Already-exited is fine here.
    if let Err(e) = child.kill().await {
        tracing::debug!("kill after tree termination: {}", e);
    }
}

#[cfg(unix)]
async fn kill_process_tree(pid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: killpg has no memory-safety preconditions; the group was created
    // for this child via `process_group(0)`.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        tracing::warn!(pid, "killpg: {}", std::io::Error::last_os_error());
    }
}

#[cfg(windows)]
async fn kill_process_tree(pid: u32) {
    let result = tokio::process::Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/T", "/F"])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await;
    if let Err(e) = result {
        tracing::warn!(pid, "taskkill: {}", e);
    }
}

#[cfg(not(any(unix, windows)))]
async fn kill_process_tree(_pid: u32) {}
