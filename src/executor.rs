use std::future::Future;

use sqlx::any::{AnyQueryResult, AnyRow};
use sqlx::{AnyConnection, AnyPool};

use crate::error::Result;
use crate::query;
use crate::value::Param;

/// Anything that can run SQL with positional parameters.
///
/// The struct and map operations in [`crate::ops`] are written against this
/// trait. It is implemented for a bare [`AnyPool`] (each call on its own
/// connection), an [`AnyConnection`] (which a `Transaction` dereferences to),
/// and the transactional [`crate::Db`] facade.
pub trait SqlExecutor {
    /// Runs a statement that returns no rows.
    fn exec(
        &mut self,
        sql: &str,
        params: &[Param],
    ) -> impl Future<Output = Result<AnyQueryResult>> + Send;

    /// Runs a query and returns all rows.
    fn query(
        &mut self,
        sql: &str,
        params: &[Param],
    ) -> impl Future<Output = Result<Vec<AnyRow>>> + Send;

    /// Runs a query and returns its first row, if any.
    fn query_row(
        &mut self,
        sql: &str,
        params: &[Param],
    ) -> impl Future<Output = Result<Option<AnyRow>>> + Send;
}

impl SqlExecutor for AnyPool {
    async fn exec(&mut self, sql: &str, params: &[Param]) -> Result<AnyQueryResult> {
        query::execute(&*self, sql, params).await
    }

    async fn query(&mut self, sql: &str, params: &[Param]) -> Result<Vec<AnyRow>> {
        query::fetch_all(&*self, sql, params).await
    }

    async fn query_row(&mut self, sql: &str, params: &[Param]) -> Result<Option<AnyRow>> {
        query::fetch_optional(&*self, sql, params).await
    }
}

impl SqlExecutor for AnyConnection {
    async fn exec(&mut self, sql: &str, params: &[Param]) -> Result<AnyQueryResult> {
        query::execute(self, sql, params).await
    }

    async fn query(&mut self, sql: &str, params: &[Param]) -> Result<Vec<AnyRow>> {
        query::fetch_all(self, sql, params).await
    }

    async fn query_row(&mut self, sql: &str, params: &[Param]) -> Result<Option<AnyRow>> {
        query::fetch_optional(self, sql, params).await
    }
}
