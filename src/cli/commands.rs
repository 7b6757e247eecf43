//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cartflow batch ETL pipeline CLI
#[derive(Parser, Debug)]
#[command(name = "cartflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (YAML)
    #[arg(short, long, global = true, default_value = "pipeline.yaml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands, one per externally scheduled stage
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch raw records from the configured source and stage them
    Extract,

    /// Clean staged records, aggregate, and write file outputs
    Transform,

    /// Load the canonical snapshot into the database target
    Load,

    /// Run extract, transform, and load in order
    Run,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_config() {
        let cli = Cli::try_parse_from(["cartflow", "-c", "etl.yaml", "run"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("etl.yaml"));
        assert!(matches!(cli.command, Commands::Run));
    }

    #[test]
    fn test_default_config_path() {
        let cli = Cli::try_parse_from(["cartflow", "extract"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("pipeline.yaml"));
    }
}
