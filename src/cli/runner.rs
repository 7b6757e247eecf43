//! CLI runner - executes stage commands

use crate::cli::commands::{Cli, Commands};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::pipeline::Pipeline;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = PipelineConfig::from_file(&self.cli.config)?;
        let pipeline = Pipeline::new(config);

        match &self.cli.command {
            Commands::Extract => {
                let rows = pipeline.extract().await?;
                println!("extract: staged {rows} record(s)");
            }
            Commands::Transform => {
                let summary = pipeline.transform().await?;
                println!(
                    "transform: kept {} record(s), dropped {} ({} missing id, {} bad date), wrote {} table(s) to {}",
                    summary.report.kept,
                    summary.report.dropped(),
                    summary.report.dropped_missing_id,
                    summary.report.dropped_bad_date,
                    summary.files.tables,
                    summary.files.target,
                );
            }
            Commands::Load => {
                let summary = pipeline.load().await?;
                println!("load: {} row(s) into {}", summary.rows, summary.target);
            }
            Commands::Run => {
                let summary = pipeline.run().await?;
                println!(
                    "run: extracted {}, kept {}, dropped {}, loaded {} row(s) into {}",
                    summary.extracted,
                    summary.transform.report.kept,
                    summary.transform.report.dropped(),
                    summary.database.rows,
                    summary.database.target,
                );
            }
        }

        Ok(())
    }
}
