//! # cartflow
//!
//! A batch ETL pipeline for e-commerce cart data: extract rows from local
//! CSV files or a paginated JSON API, clean them into a canonical record
//! set, compute grouped summary tables, and load the results into columnar
//! files and a relational table. An external scheduler triggers the three
//! stages (extract, transform, load) once per period; each stage's exit
//! status gates the next.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────┐   ┌─────────┐   ┌────────────┐   ┌──────────────────┐
//! │ Source  │ → │ Cleaner │ → │ Aggregator │ → │ Sink             │
//! │ CSV/API │   │ rules   │   │ group+sum  │   │ Parquet/CSV/Duck │
//! └─────────┘   └─────────┘   └────────────┘   └──────────────────┘
//!       extract              transform                load
//! ```
//!
//! Stages hand off through files in one staging directory; a lock file
//! keeps overlapping scheduler triggers from interleaving writes.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Record types for each stage
pub mod types;

/// Pipeline configuration
pub mod config;

/// HTTP client for the API source
pub mod http;

/// Record sources (CSV files, JSON API)
pub mod source;

/// Cleaner: raw → canonical records
pub mod clean;

/// Aggregator: grouped summary tables
pub mod aggregate;

/// Columnar output (Arrow/Parquet, atomic writes)
pub mod output;

/// Load targets (files, DuckDB)
pub mod sink;

/// Pipeline driver and stage sequencing
pub mod pipeline;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::{AggregateTable, CanonicalRecord, LoadPolicy, RawRecord, MISSING_MARKER};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
