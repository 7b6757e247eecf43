//! Cleaner: RawRecord → CanonicalRecord
//!
//! Rules, applied in order:
//! 1. Drop the record if cart_id or product_id is missing.
//! 2. Trim whitespace on every string field.
//! 3. String attribute fields empty after trimming become the explicit
//!    missing marker (present-but-empty is not the same as never set).
//! 4. Parse order_date as `YYYY-MM-DD`; unparseable or missing → drop,
//!    same policy as a missing identifier but counted separately.
//! 5. Derive numerics: line total from price × quantity when the source
//!    total is absent or zero, then order total as the per-cart sum of
//!    line totals over the kept set.
//!
//! Dropped rows are counted in the [`CleanReport`], never raised as errors;
//! a drop is final for the run. Cleaning is idempotent: feeding canonical
//! output back through changes nothing.

use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::info;

use crate::types::{CanonicalRecord, RawRecord, MISSING_MARKER};

/// Per-run validation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Rows seen.
    pub input: usize,
    /// Rows kept as canonical records.
    pub kept: usize,
    /// Rows dropped for a missing cart or product identifier.
    pub dropped_missing_id: usize,
    /// Rows dropped for a missing or unparseable order date.
    pub dropped_bad_date: usize,
}

impl CleanReport {
    /// Total rows dropped
    pub fn dropped(&self) -> usize {
        self.dropped_missing_id + self.dropped_bad_date
    }
}

/// Clean a raw record set into canonical records plus a drop report.
///
/// Output order matches input order minus dropped rows.
pub fn clean(records: &[RawRecord]) -> (Vec<CanonicalRecord>, CleanReport) {
    let mut report = CleanReport {
        input: records.len(),
        ..Default::default()
    };

    let mut canonical: Vec<CanonicalRecord> = Vec::with_capacity(records.len());
    for record in records {
        let (cart_id, product_id) = match (record.cart_id, record.product_id) {
            (Some(c), Some(p)) => (c, p),
            _ => {
                report.dropped_missing_id += 1;
                continue;
            }
        };

        let order_date = match parse_date(record.order_date.as_deref()) {
            Some(date) => date,
            None => {
                report.dropped_bad_date += 1;
                continue;
            }
        };

        let product_price = record.product_price.unwrap_or(0.0);
        let product_quantity = record.product_quantity.unwrap_or(0);
        let product_total = record.product_total.unwrap_or(0.0);
        let total_amount = if product_total == 0.0 {
            product_price * product_quantity as f64
        } else {
            product_total
        };

        let customer_name = match clean_string(record.customer_name.as_deref()) {
            name if name == MISSING_MARKER => joined_name(record),
            name => name,
        };

        canonical.push(CanonicalRecord {
            cart_id,
            user_id: record.user_id,
            product_id,
            product_title: clean_title(record.product_title.as_deref()),
            product_price,
            product_quantity,
            product_total,
            total_amount,
            // filled below once all kept rows are known
            order_total: 0.0,
            customer_name,
            email: clean_string(record.email.as_deref()),
            city: clean_string(record.city.as_deref()),
            age: record.age,
            gender: clean_string(record.gender.as_deref()),
            order_date,
        });
    }

    let order_totals = sum_by_cart(&canonical);
    for record in &mut canonical {
        record.order_total = order_totals.get(&record.cart_id).copied().unwrap_or(0.0);
    }

    report.kept = canonical.len();
    info!(
        input = report.input,
        kept = report.kept,
        dropped_missing_id = report.dropped_missing_id,
        dropped_bad_date = report.dropped_bad_date,
        "cleaned records"
    );

    (canonical, report)
}

/// Trim, with empty-after-trim replaced by the missing marker
fn clean_string(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => MISSING_MARKER.to_string(),
    }
}

/// Titles are additionally lowercased. The marker is inserted before the
/// lowercase pass so a second cleaning is a no-op.
fn clean_title(value: Option<&str>) -> String {
    clean_string(value).to_lowercase()
}

/// Fall back to first + last name when customer_name itself is missing
fn joined_name(record: &RawRecord) -> String {
    let first = record.first_name.as_deref().map(str::trim).unwrap_or("");
    let last = record.last_name.as_deref().map(str::trim).unwrap_or("");
    let joined = format!("{first} {last}");
    let joined = joined.trim();
    if joined.is_empty() {
        MISSING_MARKER.to_string()
    } else {
        joined.to_string()
    }
}

fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value?.trim(), "%Y-%m-%d").ok()
}

fn sum_by_cart(records: &[CanonicalRecord]) -> HashMap<i64, f64> {
    let mut totals: HashMap<i64, f64> = HashMap::new();
    for record in records {
        *totals.entry(record.cart_id).or_insert(0.0) += record.total_amount;
    }
    totals
}
