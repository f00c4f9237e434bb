//! CLI command handlers, one file per command.

mod check;
mod completions;
mod run;
mod stop;

pub use check::run_check;
pub use completions::run_completions;
pub use run::{run_batch, RunOptions};
pub use stop::run_stop;

#[cfg(test)]
pub(crate) use run::{parse_url_lines, progress_line};
