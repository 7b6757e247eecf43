//! Aggregator: grouped summary tables over canonical records
//!
//! Pure functions of the canonical record set; identical input yields
//! byte-identical tables. Every sort carries an explicit tie-break so float
//! ties cannot reorder between runs.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::types::{AggregateTable, CanonicalRecord};

/// Rows kept by the top-customers ranking
pub const TOP_N: usize = 5;

/// Group by calendar date, sum line totals, ascending by date
pub fn daily_sales(records: &[CanonicalRecord]) -> AggregateTable {
    // BTreeMap keeps dates sorted ascending
    let mut by_date: BTreeMap<chrono::NaiveDate, f64> = BTreeMap::new();
    for record in records {
        *by_date.entry(record.order_date).or_insert(0.0) += record.total_amount;
    }

    let rows = by_date
        .into_iter()
        .map(|(date, total)| vec![date.format("%Y-%m-%d").to_string(), fmt_amount(total)])
        .collect();

    AggregateTable::new("daily_sales", &["order_date", "daily_sales"], rows)
}

/// Group by product title: revenue plus the number of distinct carts the
/// product appears in. Revenue descending, ties by title ascending.
pub fn revenue_by_product(records: &[CanonicalRecord]) -> AggregateTable {
    let mut by_product: HashMap<&str, (f64, HashSet<i64>)> = HashMap::new();
    for record in records {
        let entry = by_product
            .entry(record.product_title.as_str())
            .or_insert_with(|| (0.0, HashSet::new()));
        entry.0 += record.total_amount;
        entry.1.insert(record.cart_id);
    }

    let mut grouped: Vec<(&str, f64, usize)> = by_product
        .into_iter()
        .map(|(title, (revenue, carts))| (title, revenue, carts.len()))
        .collect();
    grouped.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let rows = grouped
        .into_iter()
        .map(|(title, revenue, orders)| {
            vec![title.to_string(), fmt_amount(revenue), orders.to_string()]
        })
        .collect();

    AggregateTable::new(
        "revenue_by_product",
        &["product_title", "total_revenue", "order_count"],
        rows,
    )
}

/// Group by customer: distinct cart count and total spend. Spend descending,
/// ties by customer id ascending; customers with no id sort last.
pub fn customer_summary(records: &[CanonicalRecord]) -> AggregateTable {
    AggregateTable::new(
        "customer_summary",
        &["customer_id", "customer_name", "total_orders", "total_spent"],
        customer_rows(records),
    )
}

/// [`customer_summary`] truncated to the top [`TOP_N`] spenders
pub fn top_customers(records: &[CanonicalRecord]) -> AggregateTable {
    let mut rows = customer_rows(records);
    rows.truncate(TOP_N);
    AggregateTable::new(
        "top_customers",
        &["customer_id", "customer_name", "total_orders", "total_spent"],
        rows,
    )
}

/// All aggregate views, in the order the sink writes them
pub fn all_tables(records: &[CanonicalRecord]) -> Vec<AggregateTable> {
    vec![
        daily_sales(records),
        revenue_by_product(records),
        customer_summary(records),
        top_customers(records),
    ]
}

fn customer_rows(records: &[CanonicalRecord]) -> Vec<Vec<String>> {
    struct Group {
        carts: HashSet<i64>,
        spent: f64,
    }

    let mut by_customer: HashMap<(Option<i64>, &str), Group> = HashMap::new();
    for record in records {
        let key = (record.user_id, record.customer_name.as_str());
        let entry = by_customer.entry(key).or_insert_with(|| Group {
            carts: HashSet::new(),
            spent: 0.0,
        });
        entry.carts.insert(record.cart_id);
        entry.spent += record.total_amount;
    }

    let mut grouped: Vec<((Option<i64>, &str), Group)> = by_customer.into_iter().collect();
    grouped.sort_by(|a, b| {
        b.1.spent.total_cmp(&a.1.spent).then_with(|| {
            // None sorts after any concrete id; name breaks the final tie
            match (a.0 .0, b.0 .0) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.0 .1.cmp(&b.0 .1),
            }
        })
    });

    grouped
        .into_iter()
        .map(|((id, name), group)| {
            vec![
                id.map(|v| v.to_string()).unwrap_or_default(),
                name.to_string(),
                group.carts.len().to_string(),
                fmt_amount(group.spent),
            ]
        })
        .collect()
}

/// Deterministic float rendering (shortest round-trip form)
fn fmt_amount(value: f64) -> String {
    format!("{value}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn record(
        cart_id: i64,
        user_id: Option<i64>,
        title: &str,
        amount: f64,
        date: &str,
    ) -> CanonicalRecord {
        CanonicalRecord {
            cart_id,
            user_id,
            product_id: cart_id * 100,
            product_title: title.to_string(),
            product_price: amount,
            product_quantity: 1,
            product_total: amount,
            total_amount: amount,
            order_total: amount,
            customer_name: user_id
                .map(|id| format!("Customer {id}"))
                .unwrap_or_else(|| "No Data".to_string()),
            email: "No Data".to_string(),
            city: "No Data".to_string(),
            age: None,
            gender: "No Data".to_string(),
            order_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        }
    }

    #[test]
    fn test_daily_sales_sorted_ascending() {
        let records = vec![
            record(1, Some(1), "widget", 5.0, "2026-08-03"),
            record(2, Some(1), "widget", 2.5, "2026-08-01"),
            record(3, Some(1), "widget", 1.0, "2026-08-03"),
        ];

        let table = daily_sales(&records);
        assert_eq!(
            table.rows,
            vec![
                vec!["2026-08-01".to_string(), "2.5".to_string()],
                vec!["2026-08-03".to_string(), "6".to_string()],
            ]
        );
    }

    #[test]
    fn test_revenue_by_product_descending_with_tie_break() {
        let records = vec![
            record(1, Some(1), "banana", 4.0, "2026-08-01"),
            record(2, Some(1), "apple", 4.0, "2026-08-01"),
            record(3, Some(1), "cherry", 9.0, "2026-08-01"),
        ];

        let table = revenue_by_product(&records);
        let titles: Vec<&str> = table.rows.iter().map(|r| r[0].as_str()).collect();
        // cherry first on revenue; apple before banana on the tie
        assert_eq!(titles, vec!["cherry", "apple", "banana"]);
    }

    #[test]
    fn test_customer_tie_broken_by_id_ascending() {
        let records = vec![
            record(1, Some(20), "widget", 10.0, "2026-08-01"),
            record(2, Some(7), "widget", 10.0, "2026-08-01"),
        ];

        let table = top_customers(&records);
        assert_eq!(table.rows[0][0], "7");
        assert_eq!(table.rows[1][0], "20");
    }

    #[test]
    fn test_top_customers_truncates_to_five() {
        let records: Vec<CanonicalRecord> = (1..=8)
            .map(|i| record(i, Some(i), "widget", i as f64, "2026-08-01"))
            .collect();

        let table = top_customers(&records);
        assert_eq!(table.rows.len(), TOP_N);
        // biggest spender first
        assert_eq!(table.rows[0][0], "8");
        assert_eq!(customer_summary(&records).rows.len(), 8);
    }

    #[test]
    fn test_customer_orders_count_distinct_carts() {
        let records = vec![
            record(1, Some(1), "widget", 2.0, "2026-08-01"),
            record(1, Some(1), "gadget", 3.0, "2026-08-01"),
            record(2, Some(1), "widget", 4.0, "2026-08-02"),
        ];

        let table = customer_summary(&records);
        assert_eq!(table.rows[0][2], "2"); // two carts, three line items
        assert_eq!(table.rows[0][3], "9");
    }

    #[test]
    fn test_aggregation_is_deterministic() {
        let records = vec![
            record(1, Some(3), "widget", 4.0, "2026-08-01"),
            record(2, Some(1), "gadget", 4.0, "2026-08-02"),
            record(3, None, "widget", 4.0, "2026-08-01"),
        ];

        let first: Vec<String> = all_tables(&records).iter().map(AggregateTable::to_csv).collect();
        let second: Vec<String> = all_tables(&records).iter().map(AggregateTable::to_csv).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_customer_id_sorts_last_on_tie() {
        let records = vec![
            record(1, None, "widget", 5.0, "2026-08-01"),
            record(2, Some(9), "widget", 5.0, "2026-08-01"),
        ];

        let table = customer_summary(&records);
        assert_eq!(table.rows[0][0], "9");
        assert_eq!(table.rows[1][0], "");
    }
}
