//! Remote API source
//!
//! Fetches two paginated JSON collections (carts and users), builds a
//! user-id lookup, then explodes each cart's line items into one raw record
//! per item with the matching user's attributes joined in. Carts with no
//! matching user keep null user fields; they are not dropped.
//!
//! The upstream carts carry no timestamp, so an order date is synthesized:
//! distinct cart ids sorted ascending, cart at index `i` dated
//! `reference_date - (i mod 30)` days. The synthesis is deterministic for a
//! fixed reference date and is logged, never silent.

use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use url::Url;

use super::RecordSource;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::types::RawRecord;

/// Window for synthetic order dates, in days
const DATE_WINDOW_DAYS: u64 = 30;

/// Paginated JSON API source
#[derive(Debug, Clone)]
pub struct ApiSource {
    client: HttpClient,
    carts_url: String,
    users_url: String,
    page_size: usize,
    reference_date: NaiveDate,
}

impl ApiSource {
    /// Create a source for the given endpoints; synthetic dates anchor to
    /// today (UTC).
    pub fn new(carts_url: impl Into<String>, users_url: impl Into<String>, page_size: usize) -> Self {
        Self {
            client: HttpClient::new(),
            carts_url: carts_url.into(),
            users_url: users_url.into(),
            page_size,
            reference_date: Utc::now().date_naive(),
        }
    }

    /// Pin the synthetic-date anchor (tests need deterministic output)
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = date;
        self
    }

    /// Fetch every page of one collection.
    ///
    /// The response shape is a mapping with a list-of-objects field named
    /// `field` plus a `total` count; pages are walked with `limit`/`skip`.
    async fn fetch_collection(&self, base_url: &str, field: &str) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut skip = 0usize;

        loop {
            let mut url = Url::parse(base_url)?;
            url.query_pairs_mut()
                .append_pair("limit", &self.page_size.to_string())
                .append_pair("skip", &skip.to_string());

            let body = self.client.get_json(url.as_str()).await?;
            let page = body
                .get(field)
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    Error::source_read(
                        base_url,
                        format!("response has no '{field}' list field"),
                    )
                })?
                .clone();

            debug!(url = %url, fetched = page.len(), "fetched page");
            if page.is_empty() {
                break;
            }

            skip += page.len();
            items.extend(page);

            let total = body.get("total").and_then(Value::as_u64);
            match total {
                Some(total) if (skip as u64) < total => {}
                _ => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl RecordSource for ApiSource {
    fn id(&self) -> String {
        format!("api[{}]", self.carts_url)
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        let carts = self.fetch_collection(&self.carts_url, "carts").await?;
        let users = self.fetch_collection(&self.users_url, "users").await?;
        info!(carts = carts.len(), users = users.len(), "fetched collections");

        let mut records = explode_carts(&carts, &users);
        assign_synthetic_dates(&mut records, self.reference_date);
        info!(
            records = records.len(),
            window_days = DATE_WINDOW_DAYS,
            "assigned synthetic order dates"
        );

        Ok(records)
    }
}

/// Explode carts into one record per line item, joining user attributes by id
fn explode_carts(carts: &[Value], users: &[Value]) -> Vec<RawRecord> {
    let user_map: HashMap<i64, &Value> = users
        .iter()
        .filter_map(|u| u.get("id").and_then(Value::as_i64).map(|id| (id, u)))
        .collect();

    let mut records = Vec::new();
    for cart in carts {
        let cart_id = cart.get("id").and_then(Value::as_i64);
        let user_id = cart.get("userId").and_then(Value::as_i64);
        let cart_total = cart.get("total").and_then(Value::as_f64);
        let user = user_id.and_then(|id| user_map.get(&id).copied());
        if user.is_none() {
            warn!(?cart_id, ?user_id, "cart has no matching user");
        }

        let products = cart
            .get("products")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for product in products {
            let mut record = RawRecord {
                cart_id,
                user_id,
                cart_total,
                product_id: product.get("id").and_then(Value::as_i64),
                product_title: string_field(product, "title"),
                product_price: product.get("price").and_then(Value::as_f64),
                product_quantity: product.get("quantity").and_then(Value::as_i64),
                product_total: product.get("total").and_then(Value::as_f64),
                ..Default::default()
            };

            if let Some(user) = user {
                let first = string_field(user, "firstName").unwrap_or_default();
                let last = string_field(user, "lastName").unwrap_or_default();
                record.customer_name = Some(format!("{first} {last}").trim().to_string());
                record.first_name = Some(first);
                record.last_name = Some(last);
                record.email = string_field(user, "email");
                record.city = user
                    .get("address")
                    .and_then(|a| string_field(a, "city"));
                record.age = user.get("age").and_then(Value::as_i64);
                record.gender = string_field(user, "gender");
            }

            records.push(record);
        }
    }

    records
}

/// Distribute cart order dates across a bounded recent window, one date per
/// cart, stable across runs for a fixed reference date
fn assign_synthetic_dates(records: &mut [RawRecord], reference_date: NaiveDate) {
    let mut cart_ids: Vec<i64> = records.iter().filter_map(|r| r.cart_id).collect();
    cart_ids.sort_unstable();
    cart_ids.dedup();

    let date_map: HashMap<i64, String> = cart_ids
        .iter()
        .enumerate()
        .map(|(i, &id)| {
            let days_back = (i as u64) % DATE_WINDOW_DAYS;
            let date = reference_date - Days::new(days_back);
            (id, date.format("%Y-%m-%d").to_string())
        })
        .collect();

    for record in records {
        if let Some(id) = record.cart_id {
            record.order_date = date_map.get(&id).cloned();
        }
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(ToString::to_string)
}
