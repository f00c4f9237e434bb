pub mod config;
pub mod logging;

pub mod control;
pub mod job;
pub mod line_parser;
pub mod runner;
pub mod scheduler;
