//! Scanning driver rows into [`RowValue`]s.

use sqlx::any::{Any, AnyRow};
use sqlx::{Column, Decode, Row, Type};

use crate::error::{Error, Result};
use crate::value::{RowValue, Value};

fn try_decode<'r, T>(row: &'r AnyRow, index: usize) -> Option<Option<T>>
where
    T: Decode<'r, Any> + Type<Any>,
{
    row.try_get::<Option<T>, _>(index).ok()
}

/// Reads column `index` as whichever supported kind it decodes to.
pub fn decode_column(row: &AnyRow, index: usize) -> Result<Value> {
    if let Some(v) = try_decode::<bool>(row, index) {
        return Ok(v.map_or(Value::Null, Value::Bool));
    }
    if let Some(v) = try_decode::<i64>(row, index) {
        return Ok(v.map_or(Value::Null, Value::Int));
    }
    if let Some(v) = try_decode::<f64>(row, index) {
        return Ok(v.map_or(Value::Null, Value::Float));
    }
    if let Some(v) = try_decode::<f32>(row, index) {
        return Ok(v.map_or(Value::Null, |f| Value::Float(f64::from(f))));
    }
    if let Some(v) = try_decode::<String>(row, index) {
        return Ok(v.map_or(Value::Null, Value::Text));
    }
    if let Some(v) = try_decode::<Vec<u8>>(row, index) {
        return Ok(v.map_or(Value::Null, Value::Bytes));
    }

    let column = row
        .columns()
        .get(index)
        .map_or_else(|| format!("#{index}"), |c| c.name().to_owned());
    Err(Error::UnsupportedColumn(column))
}

/// Scans every column of `row`, keyed by the name the driver reports.
pub fn scan_row(row: &AnyRow) -> Result<RowValue> {
    let mut values = RowValue::with_capacity(row.len());
    for (index, column) in row.columns().iter().enumerate() {
        values.insert(column.name().to_owned(), decode_column(row, index)?);
    }
    Ok(values)
}
