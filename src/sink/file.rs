//! File-backed load target
//!
//! Writes the canonical record set as `clean_sales.parquet` and each
//! aggregate table as `<name>.csv` in one output directory. Each file is
//! written atomically; per-file atomicity is the guarantee here, not
//! cross-file.

use std::path::{Path, PathBuf};
use tracing::info;

use super::{LoadSummary, LoadTarget};
use crate::error::{Error, Result};
use crate::output::{canonical_schema, write_records_to_parquet, write_text_atomic};
use crate::types::{AggregateTable, CanonicalRecord};

/// File name of the canonical snapshot
pub const CANONICAL_SNAPSHOT: &str = "clean_sales.parquet";

/// Directory-of-files load target
#[derive(Debug, Clone)]
pub struct FileTarget {
    dir: PathBuf,
}

impl FileTarget {
    /// Create a target rooted at `dir` (created if absent)
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the canonical snapshot file
    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(CANONICAL_SNAPSHOT)
    }
}

impl LoadTarget for FileTarget {
    fn id(&self) -> String {
        self.dir.display().to_string()
    }

    fn load(
        &self,
        records: &[CanonicalRecord],
        tables: &[AggregateTable],
    ) -> Result<LoadSummary> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| Error::sink_write(self.id(), format!("create output dir: {e}")))?;

        let values = records
            .iter()
            .map(CanonicalRecord::to_value)
            .collect::<Result<Vec<_>>>()?;
        let rows = write_records_to_parquet(self.snapshot_path(), &values, &canonical_schema())?;

        for table in tables {
            let path = self.dir.join(format!("{}.csv", table.name));
            write_text_atomic(&path, &table.to_csv())?;
        }

        info!(dir = %self.dir.display(), rows, tables = tables.len(), "wrote file target");
        Ok(LoadSummary {
            target: self.id(),
            rows,
            tables: tables.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate;
    use crate::output::read_parquet_records;
    use chrono::NaiveDate;

    fn record(cart_id: i64, amount: f64) -> CanonicalRecord {
        CanonicalRecord {
            cart_id,
            user_id: Some(1),
            product_id: cart_id * 10,
            product_title: "widget".to_string(),
            product_price: amount,
            product_quantity: 1,
            product_total: amount,
            total_amount: amount,
            order_total: amount,
            customer_name: "Terry Medhurst".to_string(),
            email: "terry@example.com".to_string(),
            city: "Phoenix".to_string(),
            age: Some(50),
            gender: "male".to_string(),
            order_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
        }
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let target = FileTarget::new(dir.path());

        let records = vec![record(1, 6.0), record(2, 7.5)];
        let summary = target.load(&records, &[]).unwrap();
        assert_eq!(summary.rows, 2);

        let back: Vec<CanonicalRecord> = read_parquet_records(target.snapshot_path())
            .unwrap()
            .into_iter()
            .map(|v| CanonicalRecord::from_value(v).unwrap())
            .collect();
        assert_eq!(back, records);
    }

    #[test]
    fn test_aggregate_tables_written_as_csv() {
        let dir = tempfile::tempdir().unwrap();
        let target = FileTarget::new(dir.path());

        let records = vec![record(1, 6.0)];
        let tables = aggregate::all_tables(&records);
        target.load(&records, &tables).unwrap();

        let daily = std::fs::read_to_string(dir.path().join("daily_sales.csv")).unwrap();
        assert_eq!(daily, "order_date,daily_sales\n2026-08-01,6\n");
        assert!(dir.path().join("revenue_by_product.csv").exists());
        assert!(dir.path().join("customer_summary.csv").exists());
        assert!(dir.path().join("top_customers.csv").exists());
    }

    #[test]
    fn test_reload_overwrites_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let target = FileTarget::new(dir.path());

        target.load(&[record(1, 6.0), record(2, 1.0)], &[]).unwrap();
        target.load(&[record(3, 2.0)], &[]).unwrap();

        let back = read_parquet_records(target.snapshot_path()).unwrap();
        assert_eq!(back.len(), 1);
    }
}
