//! Command-line interface
//!
//! One subcommand per scheduler stage (`extract`, `transform`, `load`) plus
//! `run` for all three in order. Each exits non-zero on failure so the
//! external orchestrator can gate the next stage on it.

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
