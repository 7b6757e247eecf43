//! CSV file source
//!
//! Reads each configured file fully and concatenates rows in file-then-row
//! order. A missing file or a row that does not fit the [`RawRecord`] schema
//! is fatal — bad input is surfaced, never silently skipped.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::info;

use super::RecordSource;
use crate::error::{Error, Result};
use crate::types::RawRecord;

/// CSV file source with a required header row
#[derive(Debug, Clone)]
pub struct CsvSource {
    paths: Vec<PathBuf>,
}

impl CsvSource {
    /// Create a source over the given file paths
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Read and parse one file
    fn read_file(path: &Path) -> Result<Vec<RawRecord>> {
        let source_id = path.display().to_string();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::source_read(&source_id, e.to_string()))?;
        parse_csv(&contents, &source_id)
    }
}

#[async_trait]
impl RecordSource for CsvSource {
    fn id(&self) -> String {
        format!("csv[{} file(s)]", self.paths.len())
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        let mut records = Vec::new();
        for path in &self.paths {
            let rows = Self::read_file(path)?;
            info!(path = %path.display(), rows = rows.len(), "read csv file");
            records.extend(rows);
        }
        Ok(records)
    }
}

/// Parse CSV text into raw records. The first line must be a header whose
/// column names match the `RawRecord` field names.
fn parse_csv(contents: &str, source_id: &str) -> Result<Vec<RawRecord>> {
    let mut lines = contents.lines();

    let headers: Vec<String> = match lines.next() {
        Some(header_line) if !header_line.trim().is_empty() => {
            parse_csv_line(header_line, ',')
        }
        _ => {
            return Err(Error::source_read(source_id, "missing header row"));
        }
    };

    let mut records = Vec::new();
    for (line_num, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let fields = parse_csv_line(line, ',');
        let mut obj = Map::new();
        for (i, header) in headers.iter().enumerate() {
            let raw = fields.get(i).cloned().unwrap_or_default();
            obj.insert(header.clone(), parse_csv_value(&raw));
        }

        let record = RawRecord::from_value(Value::Object(obj)).map_err(|e| {
            // +2: one for the header, one for 1-based numbering
            Error::source_read(source_id, format!("malformed row at line {}: {e}", line_num + 2))
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Split one CSV line into fields, honoring double-quote escaping
fn parse_csv_line(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '"' {
            if in_quotes {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                in_quotes = true;
            }
        } else if c == delimiter && !in_quotes {
            fields.push(current.trim().to_string());
            current = String::new();
        } else {
            current.push(c);
        }
    }

    fields.push(current.trim().to_string());
    fields
}

/// Type a CSV field: integer, then float, then null/empty, else string
fn parse_csv_value(value: &str) -> Value {
    if let Ok(n) = value.parse::<i64>() {
        return Value::Number(n.into());
    }

    if let Ok(n) = value.parse::<f64>() {
        if let Some(num) = serde_json::Number::from_f64(n) {
            return Value::Number(num);
        }
    }

    if value.is_empty() || value.eq_ignore_ascii_case("null") || value.eq_ignore_ascii_case("none")
    {
        return Value::Null;
    }

    Value::String(value.to_string())
}
