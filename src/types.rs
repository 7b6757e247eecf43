//! Record types for each pipeline stage
//!
//! Each stage has a statically defined record shape, validated at the
//! Source/Cleaner boundary instead of trusted implicitly:
//!
//! - [`RawRecord`]: one unvalidated input row (CSV line or exploded cart
//!   line item); every field optional.
//! - [`CanonicalRecord`]: validated, normalized row safe for aggregation
//!   and loading; key fields non-optional.
//! - [`AggregateTable`]: a named grouped summary rendered to delimited text.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Marker written into string attribute fields that are present but empty.
///
/// Distinct from absent: an empty `city` column becomes `"No Data"`, while a
/// row with no user match keeps nulls until the Cleaner fills them.
pub const MISSING_MARKER: &str = "No Data";

// ============================================================================
// RawRecord
// ============================================================================

/// One unvalidated input row with a unified schema across both sources.
///
/// Field names double as the CSV header names and the staging-file columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawRecord {
    #[serde(default)]
    pub cart_id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub cart_total: Option<f64>,
    #[serde(default)]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub product_title: Option<String>,
    #[serde(default)]
    pub product_price: Option<f64>,
    #[serde(default)]
    pub product_quantity: Option<i64>,
    #[serde(default)]
    pub product_total: Option<f64>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub gender: Option<String>,
    /// ISO date string (`YYYY-MM-DD`); synthetic for the API source.
    #[serde(default)]
    pub order_date: Option<String>,
}

impl RawRecord {
    /// Convert to a JSON object for Arrow conversion.
    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(Error::from)
    }

    /// Build from a JSON object; extra keys are rejected so a malformed
    /// source surfaces as an error rather than a silently narrowed row.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(Error::from)
    }
}

// ============================================================================
// CanonicalRecord
// ============================================================================

/// Validated, normalized row.
///
/// Invariants (enforced by the Cleaner, relied on everywhere downstream):
/// cart_id and product_id are present, order_date parsed, string attribute
/// fields trimmed with empties replaced by [`MISSING_MARKER`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub cart_id: i64,
    pub user_id: Option<i64>,
    pub product_id: i64,
    /// Lowercased, trimmed title.
    pub product_title: String,
    pub product_price: f64,
    pub product_quantity: i64,
    pub product_total: f64,
    /// Line total: product_total when the source supplied a non-zero one,
    /// otherwise price × quantity.
    pub total_amount: f64,
    /// Sum of line totals across the whole cart this row belongs to.
    pub order_total: f64,
    pub customer_name: String,
    pub email: String,
    pub city: String,
    pub age: Option<i64>,
    pub gender: String,
    pub order_date: NaiveDate,
}

impl CanonicalRecord {
    /// Convert to a JSON object for Arrow conversion.
    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(Error::from)
    }

    /// Build from a JSON object (parquet snapshot read-back).
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(Error::from)
    }
}

// ============================================================================
// AggregateTable
// ============================================================================

/// A named grouped summary, one row per group key.
///
/// Produced fresh each run and fully replacing any prior version. Rows are
/// pre-rendered to strings so file and database targets share one shape.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateTable {
    /// Table name; doubles as the output file stem.
    pub name: String,
    /// Column names, in output order.
    pub columns: Vec<String>,
    /// One row per group key, already in final sort order.
    pub rows: Vec<Vec<String>>,
}

impl AggregateTable {
    /// Create a table from column names and rendered rows.
    pub fn new(
        name: impl Into<String>,
        columns: &[&str],
        rows: Vec<Vec<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(ToString::to_string).collect(),
            rows,
        }
    }

    /// Render as delimited text (comma-separated, header row first).
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.columns.join(","));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.join(","));
            out.push('\n');
        }
        out
    }
}

/// Policy for loading rows into an already-populated database table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPolicy {
    /// Delete existing rows, then insert — exactly the new row count remains.
    #[default]
    Replace,
    /// Keep existing rows and insert after them.
    Append,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_record_value_round_trip() {
        let record = RawRecord {
            cart_id: Some(7),
            product_id: Some(42),
            product_title: Some("Widget".to_string()),
            product_price: Some(9.99),
            product_quantity: Some(3),
            order_date: Some("2026-08-01".to_string()),
            ..Default::default()
        };

        let value = record.to_value().unwrap();
        let back = RawRecord::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_raw_record_from_partial_object() {
        let value = json!({ "cart_id": 1, "product_id": 2 });
        let record = RawRecord::from_value(value).unwrap();
        assert_eq!(record.cart_id, Some(1));
        assert_eq!(record.product_id, Some(2));
        assert_eq!(record.product_title, None);
    }

    #[test]
    fn test_canonical_record_date_serializes_as_iso() {
        let record = CanonicalRecord {
            cart_id: 1,
            user_id: Some(5),
            product_id: 2,
            product_title: "widget".to_string(),
            product_price: 3.0,
            product_quantity: 2,
            product_total: 6.0,
            total_amount: 6.0,
            order_total: 6.0,
            customer_name: "Terry Medhurst".to_string(),
            email: "terry@example.com".to_string(),
            city: "Phoenix".to_string(),
            age: Some(50),
            gender: "male".to_string(),
            order_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
        };

        let value = record.to_value().unwrap();
        assert_eq!(value["order_date"], json!("2026-08-01"));
        assert_eq!(CanonicalRecord::from_value(value).unwrap(), record);
    }

    #[test]
    fn test_aggregate_table_to_csv() {
        let table = AggregateTable::new(
            "daily_sales",
            &["order_date", "daily_sales"],
            vec![
                vec!["2026-08-01".to_string(), "6".to_string()],
                vec!["2026-08-02".to_string(), "12.5".to_string()],
            ],
        );

        assert_eq!(
            table.to_csv(),
            "order_date,daily_sales\n2026-08-01,6\n2026-08-02,12.5\n"
        );
    }
}
