//! Out-of-process control of a running batch.
//!
//! `adq run` listens on a unix socket under the XDG state dir; `adq stop`
//! connects and writes one command per line. Only `stop` exists today.

use std::path::PathBuf;

/// A command accepted on the control socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Cancel the running batch (same as `Scheduler::stop`).
    Stop,
}

impl ControlCommand {
    pub fn as_line(self) -> &'static str {
        match self {
            ControlCommand::Stop => "stop\n",
        }
    }
}

/// Parses one protocol line. Unknown or malformed lines yield `None`.
pub fn parse_control_line(line: &str) -> Option<ControlCommand> {
    match line.trim().to_ascii_lowercase().as_str() {
        "stop" | "cancel" => Some(ControlCommand::Stop),
        _ => None,
    }
}

/// Default path for the control socket (XDG state dir).
pub fn default_control_socket_path() -> std::io::Result<PathBuf> {
    let dirs = xdg::BaseDirectories::with_prefix("adq")
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    dirs.place_state_file("control.sock")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_stop_variants() {
        assert_eq!(parse_control_line("stop"), Some(ControlCommand::Stop));
        assert_eq!(parse_control_line("  STOP \n"), Some(ControlCommand::Stop));
        assert_eq!(parse_control_line("cancel"), Some(ControlCommand::Stop));
    }

    #[test]
    fn parse_rejects_unknown() {
        assert_eq!(parse_control_line(""), None);
        assert_eq!(parse_control_line("pause 3"), None);
        assert_eq!(parse_control_line("stopp"), None);
    }

    #[test]
    fn stop_line_roundtrips() {
        assert_eq!(
            parse_control_line(ControlCommand::Stop.as_line()),
            Some(ControlCommand::Stop)
        );
    }
}
