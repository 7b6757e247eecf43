//! DuckDB-backed load target
//!
//! Ensures the `transformed_data` table exists with its fixed column set,
//! then loads every canonical row inside one transaction. Under the
//! `replace` policy existing rows are deleted in the same transaction, so a
//! failed load rolls back to the pre-load state — the table is never left
//! half-written, and never holds old rows plus new ones.

use duckdb::{params, Connection};
use tracing::info;

use super::{LoadSummary, LoadTarget};
use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::types::{AggregateTable, CanonicalRecord, LoadPolicy};

/// DuckDB table load target
#[derive(Debug, Clone)]
pub struct DatabaseTarget {
    path: String,
    table: String,
    policy: LoadPolicy,
}

impl DatabaseTarget {
    /// Create a target from database config
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            path: config.path.clone(),
            table: config.table.clone(),
            policy: config.policy,
        }
    }

    fn open(&self) -> Result<Connection> {
        let conn = if self.path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(&self.path)
        };
        conn.map_err(|e| Error::sink_write(self.id(), format!("open database: {e}")))
    }

    /// Create the target table if it does not exist
    fn ensure_table(&self, conn: &Connection) -> Result<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                cart_id INTEGER,
                user_id INTEGER,
                product_id INTEGER,
                product_title TEXT,
                product_price DOUBLE,
                product_quantity INTEGER,
                product_total DOUBLE,
                total_amount DOUBLE,
                order_total DOUBLE,
                customer_name TEXT,
                email TEXT,
                city TEXT,
                order_date DATE
            );",
            self.table
        );
        conn.execute_batch(&sql)
            .map_err(|e| Error::sink_write(self.id(), format!("create table: {e}")))
    }

    /// Count rows currently in the target table
    pub fn row_count(&self) -> Result<usize> {
        let conn = self.open()?;
        self.ensure_table(&conn)?;
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", self.table), [], |row| {
                row.get(0)
            })
            .map_err(|e| Error::sink_write(self.id(), format!("count rows: {e}")))?;
        Ok(count as usize)
    }
}

impl LoadTarget for DatabaseTarget {
    fn id(&self) -> String {
        format!("{}:{}", self.path, self.table)
    }

    /// Aggregate tables are not loaded here: the database target owns one
    /// fixed-schema table of canonical rows, aggregates live in the file
    /// target.
    fn load(
        &self,
        records: &[CanonicalRecord],
        _tables: &[AggregateTable],
    ) -> Result<LoadSummary> {
        let mut conn = self.open()?;
        self.ensure_table(&conn)?;

        let tx = conn
            .transaction()
            .map_err(|e| Error::sink_write(self.id(), format!("begin transaction: {e}")))?;

        if self.policy == LoadPolicy::Replace {
            tx.execute(&format!("DELETE FROM {}", self.table), [])
                .map_err(|e| Error::sink_write(self.id(), format!("clear table: {e}")))?;
        }

        {
            let insert = format!(
                "INSERT INTO {} (
                    cart_id, user_id, product_id, product_title, product_price,
                    product_quantity, product_total, total_amount, order_total,
                    customer_name, email, city, order_date
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CAST(? AS DATE))",
                self.table
            );
            let mut stmt = tx
                .prepare(&insert)
                .map_err(|e| Error::sink_write(self.id(), format!("prepare insert: {e}")))?;

            for record in records {
                stmt.execute(params![
                    record.cart_id,
                    record.user_id,
                    record.product_id,
                    record.product_title,
                    record.product_price,
                    record.product_quantity,
                    record.product_total,
                    record.total_amount,
                    record.order_total,
                    record.customer_name,
                    record.email,
                    record.city,
                    record.order_date.format("%Y-%m-%d").to_string(),
                ])
                .map_err(|e| {
                    Error::sink_write(
                        self.id(),
                        format!("insert cart {} product {}: {e}", record.cart_id, record.product_id),
                    )
                })?;
            }
        }

        // dropping the transaction without commit rolls back
        tx.commit()
            .map_err(|e| Error::sink_write(self.id(), format!("commit: {e}")))?;

        info!(target = self.id(), rows = records.len(), policy = ?self.policy, "loaded database target");
        Ok(LoadSummary {
            target: self.id(),
            rows: records.len(),
            tables: 0,
        })
    }
}
