//! Struct and map operations over any [`SqlExecutor`].

use sqlx::any::AnyQueryResult;
use sqlx::Row;
use tracing::debug;

use crate::builder::{self, Statement};
use crate::convert::FromValue;
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::executor::SqlExecutor;
use crate::row;
use crate::schema::{Field, Record};
use crate::value::{Param, RowValue};

/// Runs a query and returns every row as a column map.
pub async fn select_maps<E>(executor: &mut E, sql: &str, params: &[Param]) -> Result<Vec<RowValue>>
where
    E: SqlExecutor,
{
    let rows = executor.query(sql, params).await?;
    rows.iter().map(row::scan_row).collect()
}

/// Runs a query and appends one `R` per row to `out`.
///
/// A leading `SELECT *` is expanded to the columns of `R`. Result columns
/// are matched to fields ignoring case, and columns `R` does not map are
/// skipped. The scanned maps are returned as well. `out` is left untouched
/// when any row fails to convert.
pub async fn select_into<R, E>(
    executor: &mut E,
    out: &mut Vec<R>,
    sql: &str,
    params: &[Param],
) -> Result<Vec<RowValue>>
where
    R: Record,
    E: SqlExecutor,
{
    let schema = R::schema();
    let sql = builder::expand_select_star(sql, schema.columns());
    let rows = select_maps(executor, &sql, params).await?;

    let mut records = Vec::with_capacity(rows.len());
    for values in &rows {
        let mut record = R::default();
        for (column, value) in values {
            let Some(field) = schema.field(column) else {
                continue;
            };
            field.set(&mut record, value).map_err(|err| Error::Column {
                column: column.clone(),
                record: schema.name(),
                source: Box::new(err),
            })?;
        }
        records.push(record);
    }
    out.append(&mut records);
    Ok(rows)
}

/// Runs a query and returns its rows as records.
pub async fn select<R, E>(executor: &mut E, sql: &str, params: &[Param]) -> Result<Vec<R>>
where
    R: Record,
    E: SqlExecutor,
{
    let mut out = Vec::new();
    select_into(executor, &mut out, sql, params).await?;
    Ok(out)
}

/// Runs a query and reads the first column of the first row as an integer.
pub async fn select_int<E>(executor: &mut E, sql: &str, params: &[Param]) -> Result<i64>
where
    E: SqlExecutor,
{
    let row = executor
        .query_row(sql, params)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    if row.columns().is_empty() {
        return Err(sqlx::Error::ColumnIndexOutOfBounds { index: 0, len: 0 }.into());
    }
    i64::from_value(&row::decode_column(&row, 0)?)
}

/// Inserts one row built from a column map.
pub async fn insert_map<E>(
    executor: &mut E,
    values: &RowValue,
    table: &str,
    dialect: Dialect,
) -> Result<AnyQueryResult>
where
    E: SqlExecutor,
{
    let columns = values
        .iter()
        .map(|(column, value)| (column.clone(), Param::new(value.clone())))
        .collect();
    run(executor, builder::insert_statement(table, columns, dialect)?).await
}

/// Updates rows from a column map.
///
/// `where_clause` numbers its placeholders from 1. They are shifted past
/// the SET arguments, and `params` are bound after them.
pub async fn update_map<E>(
    executor: &mut E,
    values: &RowValue,
    table: &str,
    dialect: Dialect,
    where_clause: &str,
    params: &[Param],
) -> Result<AnyQueryResult>
where
    E: SqlExecutor,
{
    let columns = values
        .iter()
        .map(|(column, value)| (column.clone(), Param::new(value.clone())))
        .collect();
    let statement = builder::update_statement(table, columns, dialect, where_clause, params)?;
    run(executor, statement).await
}

/// Inserts `record` into `table`.
///
/// A primary key backed by a sequence gets the sequence's next value. A key
/// the database generates is left out. Unless `null_sensitive` is set,
/// `NULL` fields are left out too.
pub async fn insert<R, E>(
    executor: &mut E,
    record: &R,
    table: &str,
    dialect: Dialect,
    null_sensitive: bool,
) -> Result<AnyQueryResult>
where
    R: Record,
    E: SqlExecutor,
{
    let schema = R::schema();
    let mut columns = Vec::with_capacity(schema.fields().len());
    if let Some(primary) = schema.primary()? {
        if let Some(sequence) = primary.sequence() {
            let id = select_int(executor, &dialect.next_sequence_value(sequence), &[])
                .await
                .map_err(|err| Error::Sequence {
                    sequence: sequence.to_owned(),
                    source: Box::new(err),
                })?;
            debug!(sequence, id, "Fetched primary key from sequence");
            columns.push((primary.column().to_owned(), Param::from(id)));
        }
    }
    columns.extend(writable_columns(schema.fields(), record, null_sensitive));
    run(executor, builder::insert_statement(table, columns, dialect)?).await
}

/// Updates the row of `table` whose primary key matches `record`.
///
/// Fails without touching the database when `R` has no primary key or the
/// key is `NULL`.
pub async fn update<R, E>(
    executor: &mut E,
    record: &R,
    table: &str,
    dialect: Dialect,
    null_sensitive: bool,
) -> Result<AnyQueryResult>
where
    R: Record,
    E: SqlExecutor,
{
    let schema = R::schema();
    let (primary, key) = primary_key(record, "update")?;
    let columns = writable_columns(schema.fields(), record, null_sensitive).collect();
    let where_clause = format!("WHERE {}={}", primary.column(), dialect.placeholder(1));
    let statement = builder::update_statement(table, columns, dialect, &where_clause, &[key])?;
    run(executor, statement).await
}

/// Deletes the row of `table` whose primary key matches `record`.
pub async fn delete<R, E>(
    executor: &mut E,
    record: &R,
    table: &str,
    dialect: Dialect,
) -> Result<AnyQueryResult>
where
    R: Record,
    E: SqlExecutor,
{
    let (primary, key) = primary_key(record, "delete")?;
    run(executor, builder::delete_statement(table, primary.column(), key, dialect)).await
}

async fn run<E: SqlExecutor>(executor: &mut E, statement: Statement) -> Result<AnyQueryResult> {
    executor.exec(&statement.sql, &statement.params).await
}

/// The primary key field of `R` and its current, non-null value.
fn primary_key<R: Record>(record: &R, operation: &'static str) -> Result<(&'static Field<R>, Param)> {
    let schema = R::schema();
    let missing = || Error::MissingPrimaryKey {
        operation,
        record: schema.name(),
    };
    let primary = schema.primary()?.ok_or_else(missing)?;
    let key = primary.param(record);
    if key.value().is_null() {
        return Err(missing());
    }
    Ok((primary, key))
}

/// Non-key fields to write, skipping `NULL`s unless `null_sensitive`.
fn writable_columns<'a, R>(
    fields: &'a [Field<R>],
    record: &'a R,
    null_sensitive: bool,
) -> impl Iterator<Item = (String, Param)> + 'a {
    fields
        .iter()
        .filter(|field| !field.is_primary())
        .map(move |field| (field.column().to_owned(), field.param(record)))
        .filter(move |(_, param)| null_sensitive || !param.value().is_null())
}
