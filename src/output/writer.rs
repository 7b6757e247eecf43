//! Parquet and text file writers with atomic overwrite
//!
//! Every write goes to a `.tmp` sibling first and is renamed into place, so
//! an overlapping reader sees either the previous snapshot or the new one,
//! never a partial file.

use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde_json::Value;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use super::schema::{batch_to_values, records_to_batch};
use crate::error::{Error, Result};

/// Write flat JSON records as a Parquet file under a fixed schema.
///
/// Returns the number of rows written.
pub fn write_records_to_parquet(
    path: impl AsRef<Path>,
    records: &[Value],
    schema: &Schema,
) -> Result<usize> {
    let path = path.as_ref();
    let batch = records_to_batch(records, schema)?;

    let temp_path = path.with_extension("parquet.tmp");
    let file = File::create(&temp_path).map_err(|e| {
        Error::sink_write(path.display().to_string(), format!("create temp file: {e}"))
    })?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, Arc::new(schema.clone()), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    std::fs::rename(&temp_path, path).map_err(|e| {
        Error::sink_write(path.display().to_string(), format!("rename temp file: {e}"))
    })?;

    debug!(path = %path.display(), rows = batch.num_rows(), "wrote parquet");
    Ok(batch.num_rows())
}

/// Read a Parquet file back into flat JSON records
pub fn read_parquet_records(path: impl AsRef<Path>) -> Result<Vec<Value>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        Error::source_read(path.display().to_string(), e.to_string())
    })?;

    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let mut records = Vec::new();
    for batch in reader {
        let batch: RecordBatch = batch?;
        records.extend(batch_to_values(&batch)?);
    }

    Ok(records)
}

/// Atomically write text content (delimited aggregate tables)
pub fn write_text_atomic(path: impl AsRef<Path>, contents: &str) -> Result<()> {
    let path = path.as_ref();
    let temp_path = path.with_extension("csv.tmp");

    std::fs::write(&temp_path, contents).map_err(|e| {
        Error::sink_write(path.display().to_string(), format!("write temp file: {e}"))
    })?;
    std::fs::rename(&temp_path, path).map_err(|e| {
        Error::sink_write(path.display().to_string(), format!("rename temp file: {e}"))
    })?;

    debug!(path = %path.display(), "wrote text file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::schema::raw_schema;
    use serde_json::json;

    #[test]
    fn test_parquet_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extracted.parquet");

        let records = vec![
            json!({"cart_id": 1, "product_id": 10, "product_title": "widget", "product_price": 3.5}),
            json!({"cart_id": 2, "product_id": 11, "product_quantity": 4}),
        ];

        let written = write_records_to_parquet(&path, &records, &raw_schema()).unwrap();
        assert_eq!(written, 2);

        let back = read_parquet_records(&path).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0]["product_title"], json!("widget"));
        assert_eq!(back[1]["product_quantity"], json!(4));
    }

    #[test]
    fn test_parquet_overwrite_replaces_old_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.parquet");

        let first = vec![json!({"cart_id": 1}), json!({"cart_id": 2})];
        write_records_to_parquet(&path, &first, &raw_schema()).unwrap();

        let second = vec![json!({"cart_id": 3})];
        write_records_to_parquet(&path, &second, &raw_schema()).unwrap();

        let back = read_parquet_records(&path).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0]["cart_id"], json!(3));
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daily_sales.csv");

        write_text_atomic(&path, "order_date,daily_sales\n2026-08-01,6\n").unwrap();

        let entries: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(entries, vec!["daily_sales.csv".to_string()]);
    }

    #[test]
    fn test_read_missing_parquet_is_source_read_error() {
        let err = read_parquet_records("/nonexistent/clean.parquet").unwrap_err();
        assert!(matches!(err, Error::SourceRead { .. }));
    }
}
