//! Record sources
//!
//! A source produces an ordered sequence of [`RawRecord`]s with one unified
//! schema, from either local CSV files or a remote JSON API. Ordering is
//! stable: file order then row order, or request order then explosion order.
//! No deduplication happens here.

mod api;
mod csv;

pub use api::ApiSource;
pub use csv::CsvSource;

use async_trait::async_trait;

use crate::config::SourceConfig;
use crate::error::Result;
use crate::types::RawRecord;

/// A producer of raw records
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Identity of this source for logs and error messages.
    fn id(&self) -> String;

    /// Fetch all records, in stable input order.
    async fn fetch(&self) -> Result<Vec<RawRecord>>;
}

/// Build the configured source
pub fn from_config(config: &SourceConfig) -> Box<dyn RecordSource> {
    match config {
        SourceConfig::Csv { paths } => Box::new(CsvSource::new(paths.clone())),
        SourceConfig::Api {
            carts_url,
            users_url,
            page_size,
        } => Box::new(ApiSource::new(carts_url, users_url, *page_size)),
    }
}
