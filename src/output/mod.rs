//! Columnar output
//!
//! Conversion between flat JSON records and Arrow RecordBatches, plus
//! Parquet read/write for the canonical snapshot and the stage handoff
//! file. All file writes are atomic (temp file then rename) so a reader
//! triggered by the scheduler never observes a partial file.

mod schema;
mod writer;

pub use schema::{batch_to_values, canonical_schema, raw_schema, records_to_batch};
pub use writer::{read_parquet_records, write_records_to_parquet, write_text_atomic};
