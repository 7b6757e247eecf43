//! Sinks
//!
//! A [`LoadTarget`] persists canonical records and aggregate tables to one
//! durable destination. Two implementations: a file-backed target (Parquet
//! snapshot plus delimited aggregate tables, atomic overwrite) and a
//! DuckDB-backed target (fixed-schema table, transactional load). The
//! pipeline driver only talks to the trait, so targets are swappable
//! without touching the Cleaner or Aggregator.

mod database;
mod file;

pub use database::DatabaseTarget;
pub use file::FileTarget;

use crate::error::Result;
use crate::types::{AggregateTable, CanonicalRecord};

/// Outcome of one load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    /// Identity of the target written.
    pub target: String,
    /// Canonical rows persisted.
    pub rows: usize,
    /// Aggregate tables persisted.
    pub tables: usize,
}

/// A durable destination for pipeline output
pub trait LoadTarget {
    /// Identity for logs and error messages (path or table name).
    fn id(&self) -> String;

    /// Persist the canonical set and aggregates.
    ///
    /// Must be all-or-nothing per destination: on failure the target keeps
    /// its pre-load state, never a half-written one.
    fn load(
        &self,
        records: &[CanonicalRecord],
        tables: &[AggregateTable],
    ) -> Result<LoadSummary>;
}
