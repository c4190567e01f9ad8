use sqlx::any::{Any, AnyArguments, AnyQueryResult, AnyRow};
use sqlx::query::Query;
use sqlx::Executor;
use tracing::debug;

use crate::value::{Param, Value, ValueKind};

/// Type alias for SQLx Query with `Any` arguments
pub type Q<'q> = Query<'q, Any, AnyArguments<'q>>;

/// Binds a single parameter, giving `NULL`s the parameter's kind.
pub fn bind<'q>(q: Q<'q>, param: &Param) -> Q<'q> {
    match (param.value(), param.kind()) {
        (Value::Null, Some(ValueKind::Bool)) => q.bind(None::<bool>),
        (Value::Null, Some(ValueKind::Int)) => q.bind(None::<i64>),
        (Value::Null, Some(ValueKind::Float)) => q.bind(None::<f64>),
        (Value::Null, Some(ValueKind::Bytes)) => q.bind(None::<Vec<u8>>),
        (Value::Null, _) => q.bind(None::<String>),
        (Value::Bool(b), _) => q.bind(*b),
        (Value::Int(i), _) => q.bind(*i),
        (Value::Float(f), _) => q.bind(*f),
        (Value::Text(s), _) => q.bind(s.clone()),
        (Value::Bytes(b), _) => q.bind(b.clone()),
    }
}

/// Builds a query for `sql` with every parameter bound in order.
pub fn prepare<'q>(sql: &'q str, params: &[Param]) -> Q<'q> {
    params.iter().fold(sqlx::query::<Any>(sql), bind)
}

/// Runs a statement that returns no rows.
///
/// Works with any SQLx `Executor` over `Any`: a pool, a connection or a
/// transaction.
pub async fn execute<'e, E>(executor: E, sql: &str, params: &[Param]) -> crate::Result<AnyQueryResult>
where
    E: Executor<'e, Database = Any>,
{
    debug!(sql = %sql, params = params.len(), "Executing statement");
    Ok(prepare(sql, params).execute(executor).await?)
}

/// Runs a query and returns all rows.
pub async fn fetch_all<'e, E>(executor: E, sql: &str, params: &[Param]) -> crate::Result<Vec<AnyRow>>
where
    E: Executor<'e, Database = Any>,
{
    debug!(sql = %sql, params = params.len(), "Executing query");
    Ok(prepare(sql, params).fetch_all(executor).await?)
}

/// Runs a query and returns the first row, if any.
pub async fn fetch_optional<'e, E>(
    executor: E,
    sql: &str,
    params: &[Param],
) -> crate::Result<Option<AnyRow>>
where
    E: Executor<'e, Database = Any>,
{
    debug!(sql = %sql, params = params.len(), "Executing single-row query");
    Ok(prepare(sql, params).fetch_optional(executor).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Execute;

    #[test]
    fn test_prepare_keeps_sql() {
        let params = crate::params![1, "a", None::<i64>];
        let query = prepare("SELECT * FROM users WHERE id = $1", &params);
        assert_eq!(query.sql(), "SELECT * FROM users WHERE id = $1");
    }

    #[test]
    fn test_prepare_without_params() {
        let query = prepare("SELECT 1", &[]);
        assert_eq!(query.sql(), "SELECT 1");
    }
}
