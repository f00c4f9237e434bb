//! Jobs: one source URL each, with its own state machine.
//!
//! A job is created `Pending`, becomes `Queued` when admitted to a batch,
//! `Downloading` while a runner owns it, and ends in exactly one terminal
//! state (`Completed`, `Failed`, `Stopped`).

mod source;
mod types;

pub use source::{normalize_source, same_source};
pub use types::*;
