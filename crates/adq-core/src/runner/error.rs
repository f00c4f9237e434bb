//! Runner error taxonomy.

use thiserror::Error;

/// Why a run did not complete.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The tool could not be located or started: a missing dependency, not a
    /// download failure.
    #[error("could not start `{program}` (is it installed and on PATH?): {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool exited non-zero. `message` is its last error line, if any.
    #[error("{message}")]
    ToolExit { code: Option<i32>, message: String },

    /// Cancellation was observed; the job is stopped, not failed.
    #[error("cancelled")]
    Cancelled,

    #[error("tool i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("runner panicked: {0}")]
    Panicked(String),
}

impl RunnerError {
    /// Builds a `ToolExit`, falling back to a generic message when the tool
    /// printed no error line.
    pub fn tool_exit(code: Option<i32>, last_error: Option<String>) -> Self {
        let message = match (last_error, code) {
            (Some(line), _) => line,
            (None, Some(code)) => format!("tool exited with code {code}"),
            (None, None) => "tool was terminated by a signal".to_string(),
        };
        RunnerError::ToolExit { code, message }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunnerError::Cancelled)
    }
}
