//! Pipeline driver
//!
//! Sequences Source → Cleaner → Aggregator → Sink. The three stages are
//! separately invocable (the external scheduler gates each on the previous
//! one's exit status) and hand off through files in the staging directory:
//!
//! - extract   → `extracted.parquet`
//! - transform → `clean_sales.parquet` + aggregate CSVs
//! - load      → database table
//!
//! At most one run per staging directory is in flight: every entry point
//! takes a lock file created with `create_new`, and a second trigger while
//! the lock exists fails fast instead of interleaving writes. A failed
//! stage leaves the previous stage's output intact for inspection and
//! retry.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::clean::{self, CleanReport};
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::output::{raw_schema, read_parquet_records, write_records_to_parquet};
use crate::sink::{DatabaseTarget, FileTarget, LoadSummary, LoadTarget};
use crate::types::{CanonicalRecord, RawRecord};
use crate::{aggregate, source};

/// Stage handoff file written by extract
pub const STAGING_FILE: &str = "extracted.parquet";

const LOCK_FILE: &str = ".cartflow.lock";

/// Result of the transform stage
#[derive(Debug, Clone, PartialEq)]
pub struct TransformSummary {
    pub report: CleanReport,
    pub files: LoadSummary,
}

/// Result of a full run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub extracted: usize,
    pub transform: TransformSummary,
    pub database: LoadSummary,
}

/// The pipeline driver
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a driver for the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Extract: fetch raw records and write the staging file
    pub async fn extract(&self) -> Result<usize> {
        let _lock = RunLock::acquire(&self.config.staging_dir)?;
        self.extract_inner().await
    }

    /// Transform: clean the staged records, aggregate, write file outputs
    pub async fn transform(&self) -> Result<TransformSummary> {
        let _lock = RunLock::acquire(&self.config.staging_dir)?;
        self.transform_inner()
    }

    /// Load: push the canonical snapshot into the database target
    pub async fn load(&self) -> Result<LoadSummary> {
        let _lock = RunLock::acquire(&self.config.staging_dir)?;
        self.load_inner()
    }

    /// All three stages in order; stops before the dependent stage on failure
    pub async fn run(&self) -> Result<RunSummary> {
        let _lock = RunLock::acquire(&self.config.staging_dir)?;

        let extracted = self.extract_inner().await?;
        let transform = self.transform_inner()?;
        let database = self.load_inner()?;

        Ok(RunSummary {
            extracted,
            transform,
            database,
        })
    }

    async fn extract_inner(&self) -> Result<usize> {
        let source = source::from_config(&self.config.source);
        info!(source = %source.id(), "extract: fetching records");
        let records = source.fetch().await?;

        let values = records
            .iter()
            .map(RawRecord::to_value)
            .collect::<Result<Vec<_>>>()?;
        let rows = write_records_to_parquet(self.staging_path(), &values, &raw_schema())?;
        info!(rows, path = %self.staging_path().display(), "extract: staged records");
        Ok(rows)
    }

    fn transform_inner(&self) -> Result<TransformSummary> {
        let staging = self.staging_path();
        if !staging.exists() {
            return Err(Error::MissingStageOutput {
                stage: "extract".to_string(),
                path: staging.display().to_string(),
            });
        }

        let raw = read_parquet_records(&staging)?
            .into_iter()
            .map(RawRecord::from_value)
            .collect::<Result<Vec<_>>>()?;

        let (canonical, report) = clean::clean(&raw);
        let tables = aggregate::all_tables(&canonical);

        let target = FileTarget::new(&self.config.staging_dir);
        let files = target.load(&canonical, &tables)?;
        info!(kept = report.kept, dropped = report.dropped(), "transform: done");

        Ok(TransformSummary { report, files })
    }

    fn load_inner(&self) -> Result<LoadSummary> {
        let snapshot = FileTarget::new(&self.config.staging_dir).snapshot_path();
        if !snapshot.exists() {
            return Err(Error::MissingStageOutput {
                stage: "transform".to_string(),
                path: snapshot.display().to_string(),
            });
        }

        let canonical = read_parquet_records(&snapshot)?
            .into_iter()
            .map(CanonicalRecord::from_value)
            .collect::<Result<Vec<_>>>()?;

        let target = DatabaseTarget::new(self.config.database()?);
        let summary = target.load(&canonical, &[])?;
        info!(rows = summary.rows, target = summary.target.as_str(), "load: done");
        Ok(summary)
    }

    fn staging_path(&self) -> PathBuf {
        self.config.staging_dir.join(STAGING_FILE)
    }
}

/// Lock file guarding one staging directory.
///
/// Held for the duration of a stage (or a full run) and removed on drop,
/// including error paths.
struct RunLock {
    path: PathBuf,
}

impl RunLock {
    fn acquire(staging_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(staging_dir)?;
        let path = staging_dir.join(LOCK_FILE);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(Self { path }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(Error::PipelineBusy {
                    lock_path: path.display().to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, SourceConfig};
    use crate::types::LoadPolicy;

    fn csv_config(dir: &Path, csv: &Path) -> PipelineConfig {
        PipelineConfig {
            source: SourceConfig::Csv {
                paths: vec![csv.to_path_buf()],
            },
            staging_dir: dir.to_path_buf(),
            database: Some(DatabaseConfig {
                path: dir.join("retail.duckdb").display().to_string(),
                table: "transformed_data".to_string(),
                policy: LoadPolicy::Replace,
            }),
        }
    }

    fn write_sample_csv(dir: &Path) -> PathBuf {
        let path = dir.join("sales.csv");
        std::fs::write(
            &path,
            "cart_id,product_id,product_title,product_price,product_quantity,order_date\n\
             1,10,Widget,3.0,2,2026-08-01\n\
             ,11,Orphan,5.0,1,2026-08-01\n\
             2,12,Gadget,7.0,0,2026-08-01\n",
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn test_stage_order_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_sample_csv(dir.path());
        let pipeline = Pipeline::new(csv_config(dir.path(), &csv));

        // transform before extract
        let err = pipeline.transform().await.unwrap_err();
        assert!(matches!(err, Error::MissingStageOutput { ref stage, .. } if stage == "extract"));

        // load before transform
        pipeline.extract().await.unwrap();
        let err = pipeline.load().await.unwrap_err();
        assert!(matches!(err, Error::MissingStageOutput { ref stage, .. } if stage == "transform"));
    }

    #[tokio::test]
    async fn test_full_run_from_csv() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_sample_csv(dir.path());
        let pipeline = Pipeline::new(csv_config(dir.path(), &csv));

        let summary = pipeline.run().await.unwrap();
        assert_eq!(summary.extracted, 3);
        assert_eq!(summary.transform.report.kept, 2);
        assert_eq!(summary.transform.report.dropped_missing_id, 1);
        assert_eq!(summary.database.rows, 2);

        // line totals 6.0 and 0.0 land on the same date
        let daily = std::fs::read_to_string(dir.path().join("daily_sales.csv")).unwrap();
        assert_eq!(daily, "order_date,daily_sales\n2026-08-01,6\n");
    }

    #[tokio::test]
    async fn test_second_trigger_rejected_while_locked() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_sample_csv(dir.path());
        let pipeline = Pipeline::new(csv_config(dir.path(), &csv));

        let _held = RunLock::acquire(dir.path()).unwrap();
        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, Error::PipelineBusy { .. }));
    }

    #[tokio::test]
    async fn test_lock_released_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.csv");
        let pipeline = Pipeline::new(csv_config(dir.path(), &missing));

        assert!(pipeline.extract().await.is_err());
        // failure path must not leave the lock behind
        assert!(RunLock::acquire(dir.path()).is_ok());
    }
}
