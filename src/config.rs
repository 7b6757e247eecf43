//! Pipeline configuration
//!
//! One explicit [`PipelineConfig`] structure loaded from YAML and passed to
//! each component at construction. There is no ambient global state: the
//! source, sink, and driver each receive the piece of config they need.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::LoadPolicy;

/// Complete pipeline configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Where raw records come from.
    pub source: SourceConfig,

    /// Directory for stage handoff files and file-target outputs.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,

    /// Database load target; optional so extract/transform can run without
    /// a database configured. The load stage requires it.
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("data/processed")
}

/// Record source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    /// Local CSV files, read fully in the listed order.
    Csv {
        /// Input file paths; each must exist and parse.
        paths: Vec<PathBuf>,
    },
    /// Two paginated JSON collections fetched over HTTP.
    Api {
        /// Carts collection endpoint (without pagination params).
        carts_url: String,
        /// Users collection endpoint (without pagination params).
        users_url: String,
        /// Page size for the `limit`/`skip` pagination loop.
        #[serde(default = "default_page_size")]
        page_size: usize,
    },
}

fn default_page_size() -> usize {
    100
}

/// Database load target configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// DuckDB database file path (`:memory:` for tests).
    pub path: String,

    /// Target table name.
    #[serde(default = "default_table")]
    pub table: String,

    /// Replace or append on load.
    #[serde(default)]
    pub policy: LoadPolicy,
}

fn default_table() -> String {
    "transformed_data".to_string()
}

impl PipelineConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Cannot read config file {}: {e}", path.display()))
        })?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        match &self.source {
            SourceConfig::Csv { paths } => {
                if paths.is_empty() {
                    return Err(Error::config("source.paths must list at least one file"));
                }
            }
            SourceConfig::Api {
                carts_url,
                users_url,
                page_size,
            } => {
                if carts_url.is_empty() || users_url.is_empty() {
                    return Err(Error::config(
                        "source.carts_url and source.users_url are required",
                    ));
                }
                if *page_size == 0 {
                    return Err(Error::config("source.page_size must be positive"));
                }
            }
        }

        if let Some(db) = &self.database {
            if db.path.is_empty() {
                return Err(Error::config("database.path must not be empty"));
            }
            if db.table.is_empty() {
                return Err(Error::config("database.table must not be empty"));
            }
        }

        Ok(())
    }

    /// Database config, or a config error if the load stage has no target.
    pub fn database(&self) -> Result<&DatabaseConfig> {
        self.database
            .as_ref()
            .ok_or_else(|| Error::config("no database target configured for the load stage"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_config() {
        let yaml = r"
source:
  kind: api
  carts_url: https://dummyjson.com/carts
  users_url: https://dummyjson.com/users
staging_dir: /tmp/cartflow
database:
  path: /tmp/retail.duckdb
  policy: replace
";
        let config = PipelineConfig::from_yaml(yaml).unwrap();
        match &config.source {
            SourceConfig::Api { page_size, .. } => assert_eq!(*page_size, 100),
            SourceConfig::Csv { .. } => panic!("expected api source"),
        }
        let db = config.database().unwrap();
        assert_eq!(db.table, "transformed_data");
        assert_eq!(db.policy, LoadPolicy::Replace);
    }

    #[test]
    fn test_parse_csv_config() {
        let yaml = r"
source:
  kind: csv
  paths:
    - data/raw/sample_sales.csv
";
        let config = PipelineConfig::from_yaml(yaml).unwrap();
        match &config.source {
            SourceConfig::Csv { paths } => assert_eq!(paths.len(), 1),
            SourceConfig::Api { .. } => panic!("expected csv source"),
        }
        assert_eq!(config.staging_dir, PathBuf::from("data/processed"));
        assert!(config.database().is_err());
    }

    #[test]
    fn test_empty_paths_rejected() {
        let yaml = "
source:
  kind: csv
  paths: []
";
        assert!(PipelineConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let yaml = "
source:
  kind: api
  carts_url: http://localhost/carts
  users_url: http://localhost/users
  page_size: 0
";
        assert!(PipelineConfig::from_yaml(yaml).is_err());
    }
}
