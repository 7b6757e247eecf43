//! Error types for cartflow
//!
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! Per-record validation failures are deliberately NOT errors: the Cleaner
//! drops those rows and counts them in its report.

use thiserror::Error;

/// The main error type for cartflow
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Source Errors
    // ============================================================================
    /// Missing or malformed input: fatal to the run, never silently skipped.
    #[error("Failed to read source '{source_id}': {message}")]
    SourceRead { source_id: String, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    // ============================================================================
    // Sink Errors
    // ============================================================================
    /// I/O or connectivity failure writing an output. Carries the identity of
    /// the load target so a failed stage names what it could not write.
    #[error("Failed to write to target '{target}': {message}")]
    SinkWrite { target: String, message: String },

    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),

    // ============================================================================
    // Arrow/Parquet Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    // ============================================================================
    // Pipeline Errors
    // ============================================================================
    /// A prior run still holds the staging lock.
    #[error("Pipeline busy: lock file {lock_path} exists (another run in flight?)")]
    PipelineBusy { lock_path: String },

    /// A stage was invoked before the stage it depends on produced output.
    #[error("Missing output of stage '{stage}': {path} (run '{stage}' first)")]
    MissingStageOutput { stage: String, path: String },

    // ============================================================================
    // I/O and Generic Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a source read error
    pub fn source_read(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceRead {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a sink write error
    pub fn sink_write(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, url: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            url: url.into(),
        }
    }
}

/// Result type alias for cartflow
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("bad staging dir");
        assert_eq!(err.to_string(), "Configuration error: bad staging dir");

        let err = Error::source_read("data/raw/sales.csv", "file not found");
        assert_eq!(
            err.to_string(),
            "Failed to read source 'data/raw/sales.csv': file not found"
        );

        let err = Error::sink_write("transformed_data", "connection refused");
        assert_eq!(
            err.to_string(),
            "Failed to write to target 'transformed_data': connection refused"
        );

        let err = Error::http_status(503, "https://example.com/carts");
        assert_eq!(err.to_string(), "HTTP 503 from https://example.com/carts");
    }
}
