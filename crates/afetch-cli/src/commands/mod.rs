//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod cached;
pub mod config;
pub mod fetch;
pub mod prompt;
