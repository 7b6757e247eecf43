//! Fixed Arrow schemas and JSON ↔ Arrow conversion
//!
//! Record shapes are statically defined per stage, so the schemas here are
//! fixed rather than inferred: every column is one of Int64, Float64, or
//! Utf8, nullable. Dates travel as ISO strings.

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use serde_json::{Map, Number, Value};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Schema of the staging file written by the extract stage
pub fn raw_schema() -> Schema {
    Schema::new(vec![
        Field::new("cart_id", DataType::Int64, true),
        Field::new("user_id", DataType::Int64, true),
        Field::new("cart_total", DataType::Float64, true),
        Field::new("product_id", DataType::Int64, true),
        Field::new("product_title", DataType::Utf8, true),
        Field::new("product_price", DataType::Float64, true),
        Field::new("product_quantity", DataType::Int64, true),
        Field::new("product_total", DataType::Float64, true),
        Field::new("first_name", DataType::Utf8, true),
        Field::new("last_name", DataType::Utf8, true),
        Field::new("customer_name", DataType::Utf8, true),
        Field::new("email", DataType::Utf8, true),
        Field::new("city", DataType::Utf8, true),
        Field::new("age", DataType::Int64, true),
        Field::new("gender", DataType::Utf8, true),
        Field::new("order_date", DataType::Utf8, true),
    ])
}

/// Schema of the canonical snapshot written by the transform stage
pub fn canonical_schema() -> Schema {
    Schema::new(vec![
        Field::new("cart_id", DataType::Int64, true),
        Field::new("user_id", DataType::Int64, true),
        Field::new("product_id", DataType::Int64, true),
        Field::new("product_title", DataType::Utf8, true),
        Field::new("product_price", DataType::Float64, true),
        Field::new("product_quantity", DataType::Int64, true),
        Field::new("product_total", DataType::Float64, true),
        Field::new("total_amount", DataType::Float64, true),
        Field::new("order_total", DataType::Float64, true),
        Field::new("customer_name", DataType::Utf8, true),
        Field::new("email", DataType::Utf8, true),
        Field::new("city", DataType::Utf8, true),
        Field::new("age", DataType::Int64, true),
        Field::new("gender", DataType::Utf8, true),
        Field::new("order_date", DataType::Utf8, true),
    ])
}

/// Convert flat JSON objects to one RecordBatch under the given schema
pub fn records_to_batch(records: &[Value], schema: &Schema) -> Result<RecordBatch> {
    if records.is_empty() {
        return Ok(RecordBatch::new_empty(Arc::new(schema.clone())));
    }

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let values: Vec<Option<&Value>> = records
            .iter()
            .map(|record| record.get(field.name()))
            .collect();
        columns.push(build_array(&values, field.data_type(), field.name())?);
    }

    RecordBatch::try_new(Arc::new(schema.clone()), columns).map_err(Error::from)
}

/// Convert a RecordBatch back to flat JSON objects.
///
/// Null cells are omitted rather than written as JSON null, so optional
/// record fields deserialize to `None`.
pub fn batch_to_values(batch: &RecordBatch) -> Result<Vec<Value>> {
    let schema = batch.schema();
    let mut records = Vec::with_capacity(batch.num_rows());

    for row in 0..batch.num_rows() {
        let mut obj = Map::new();
        for (col, field) in schema.fields().iter().enumerate() {
            let array = batch.column(col);
            if array.is_null(row) {
                continue;
            }
            let value = cell_to_value(array, field.data_type(), row, field.name())?;
            obj.insert(field.name().clone(), value);
        }
        records.push(Value::Object(obj));
    }

    Ok(records)
}

fn build_array(values: &[Option<&Value>], dtype: &DataType, name: &str) -> Result<ArrayRef> {
    match dtype {
        DataType::Int64 => {
            let ints: Vec<Option<i64>> = values
                .iter()
                .map(|v| v.and_then(Value::as_i64))
                .collect();
            Ok(Arc::new(Int64Array::from(ints)))
        }
        DataType::Float64 => {
            // accepts integer JSON numbers too
            let floats: Vec<Option<f64>> = values
                .iter()
                .map(|v| v.and_then(Value::as_f64))
                .collect();
            Ok(Arc::new(Float64Array::from(floats)))
        }
        DataType::Utf8 => {
            let strings: Vec<Option<&str>> = values
                .iter()
                .map(|v| v.and_then(Value::as_str))
                .collect();
            Ok(Arc::new(StringArray::from(strings)))
        }
        other => Err(Error::decode(format!(
            "unsupported column type {other} for field '{name}'"
        ))),
    }
}

fn cell_to_value(array: &ArrayRef, dtype: &DataType, row: usize, name: &str) -> Result<Value> {
    match dtype {
        DataType::Int64 => {
            let arr = array
                .as_any()
                .downcast_ref::<Int64Array>()
                .ok_or_else(|| Error::decode(format!("column '{name}' is not Int64")))?;
            Ok(Value::Number(Number::from(arr.value(row))))
        }
        DataType::Float64 => {
            let arr = array
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| Error::decode(format!("column '{name}' is not Float64")))?;
            Number::from_f64(arr.value(row))
                .map(Value::Number)
                .ok_or_else(|| Error::decode(format!("non-finite value in column '{name}'")))
        }
        DataType::Utf8 => {
            let arr = array
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| Error::decode(format!("column '{name}' is not Utf8")))?;
            Ok(Value::String(arr.value(row).to_string()))
        }
        other => Err(Error::decode(format!(
            "unsupported column type {other} for field '{name}'"
        ))),
    }
}
