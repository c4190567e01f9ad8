use std::fmt;

use sqlx::any::{Any, AnyQueryResult, AnyRow};
use sqlx::{AnyConnection, AnyPool, Transaction};
use tracing::{debug, warn};

use crate::dialect::Dialect;
use crate::error::Result;
use crate::executor::SqlExecutor;
use crate::ops;
use crate::query;
use crate::schema::Record;
use crate::value::{Param, RowValue};

/// A database handle that runs everything inside one lazily opened
/// transaction.
///
/// The first statement begins the transaction and every later call reuses
/// it. [`Db::close`] commits or rolls it back. Dropping a `Db` without
/// closing it rolls back. Use one `Db` per logical transaction.
///
/// # Examples
///
/// ```rust,no_run
/// use sqlx::AnyPool;
/// use sqlx_dbutils::{params, Db, SqlExecutor};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = AnyPool::connect("postgres://localhost/test").await?;
/// let mut db = Db::postgres(pool);
///
/// let count = db.select_int("SELECT count(*) FROM users WHERE active = $1", &params![true]).await?;
/// db.exec("UPDATE stats SET users = $1", &params![count]).await?;
/// db.close(true).await?;
/// # Ok(())
/// # }
/// ```
pub struct Db {
    pool: AnyPool,
    tx: Option<Transaction<'static, Any>>,
    dialect: Dialect,
    null_sensitive: bool,
}

impl Db {
    pub fn new(pool: AnyPool, dialect: Dialect) -> Self {
        Self {
            pool,
            tx: None,
            dialect,
            null_sensitive: false,
        }
    }

    /// A handle using `$N` placeholders.
    pub fn postgres(pool: AnyPool) -> Self {
        Self::new(pool, Dialect::Postgres)
    }

    /// A handle using `:N` placeholders.
    pub fn oracle(pool: AnyPool) -> Self {
        Self::new(pool, Dialect::Oracle)
    }

    /// Makes inserts and updates write `NULL` fields instead of skipping them.
    pub fn null_sensitive(mut self) -> Self {
        self.null_sensitive = true;
        self
    }

    pub fn set_null_sensitive(&mut self, null_sensitive: bool) {
        self.null_sensitive = null_sensitive;
    }

    pub fn is_null_sensitive(&self) -> bool {
        self.null_sensitive
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Whether a transaction has been opened.
    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    /// The open transaction's connection, beginning the transaction first if
    /// needed.
    async fn connection(&mut self) -> Result<&mut AnyConnection> {
        let tx = match self.tx.take() {
            Some(tx) => tx,
            None => {
                let tx = self.pool.begin().await?;
                debug!("Transaction started");
                tx
            }
        };
        Ok(&mut **self.tx.insert(tx))
    }

    /// Ends the transaction, committing when `commit` is true.
    ///
    /// Does nothing if no statement ran.
    pub async fn close(self, commit: bool) -> Result<()> {
        let Some(tx) = self.tx else {
            return Ok(());
        };
        if commit {
            tx.commit().await?;
            debug!("Transaction committed");
        } else {
            tx.rollback().await?;
            debug!("Transaction rolled back");
        }
        Ok(())
    }

    /// Runs a query and returns every row as a column map.
    pub async fn select_maps(&mut self, sql: &str, params: &[Param]) -> Result<Vec<RowValue>> {
        ops::select_maps(self, sql, params).await
    }

    /// Appends one record per row to `out` and returns the scanned maps.
    pub async fn select_into<R: Record>(
        &mut self,
        out: &mut Vec<R>,
        sql: &str,
        params: &[Param],
    ) -> Result<Vec<RowValue>> {
        ops::select_into(self, out, sql, params).await
    }

    /// Runs a query and returns its rows as records.
    pub async fn select<R: Record>(&mut self, sql: &str, params: &[Param]) -> Result<Vec<R>> {
        ops::select(self, sql, params).await
    }

    /// Reads the first column of the first row as an integer.
    pub async fn select_int(&mut self, sql: &str, params: &[Param]) -> Result<i64> {
        ops::select_int(self, sql, params).await
    }

    pub async fn insert<R: Record>(&mut self, record: &R, table: &str) -> Result<AnyQueryResult> {
        let (dialect, null_sensitive) = (self.dialect, self.null_sensitive);
        ops::insert(self, record, table, dialect, null_sensitive).await
    }

    pub async fn update<R: Record>(&mut self, record: &R, table: &str) -> Result<AnyQueryResult> {
        let (dialect, null_sensitive) = (self.dialect, self.null_sensitive);
        ops::update(self, record, table, dialect, null_sensitive).await
    }

    pub async fn delete<R: Record>(&mut self, record: &R, table: &str) -> Result<AnyQueryResult> {
        let dialect = self.dialect;
        ops::delete(self, record, table, dialect).await
    }

    pub async fn insert_map(&mut self, values: &RowValue, table: &str) -> Result<AnyQueryResult> {
        let dialect = self.dialect;
        ops::insert_map(self, values, table, dialect).await
    }

    pub async fn update_map(
        &mut self,
        values: &RowValue,
        table: &str,
        where_clause: &str,
        params: &[Param],
    ) -> Result<AnyQueryResult> {
        let dialect = self.dialect;
        ops::update_map(self, values, table, dialect, where_clause, params).await
    }
}

impl fmt::Debug for Db {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db")
            .field("dialect", &self.dialect)
            .field("null_sensitive", &self.null_sensitive)
            .field("in_transaction", &self.tx.is_some())
            .finish_non_exhaustive()
    }
}

impl SqlExecutor for Db {
    async fn exec(&mut self, sql: &str, params: &[Param]) -> Result<AnyQueryResult> {
        let conn = self.connection().await?;
        query::execute(conn, sql, params).await
    }

    async fn query(&mut self, sql: &str, params: &[Param]) -> Result<Vec<AnyRow>> {
        let conn = self.connection().await?;
        query::fetch_all(conn, sql, params).await
    }

    /// Falls back to the pool when the transaction cannot be opened.
    async fn query_row(&mut self, sql: &str, params: &[Param]) -> Result<Option<AnyRow>> {
        if let Err(err) = self.connection().await {
            warn!(error = %err, "Could not begin transaction, querying outside of it");
        }
        match self.tx.as_mut() {
            Some(tx) => query::fetch_optional(&mut **tx, sql, params).await,
            None => query::fetch_optional(&self.pool, sql, params).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::params;
    use crate::schema::tests::{Account, Audit, Ticket, TwoKeys};
    use crate::value::Value;
    use sqlx::any::AnyPoolOptions;

    const CREATE_ACCOUNTS: &str = "CREATE TABLE accounts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        balance REAL,
        note TEXT DEFAULT 'n/a',
        avatar BLOB NOT NULL,
        active INTEGER NOT NULL,
        created_by TEXT NOT NULL,
        revision INTEGER NOT NULL
    )";

    async fn memory_pool() -> AnyPool {
        sqlx::any::install_default_drivers();
        let mut pool = AnyPoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        pool.exec(CREATE_ACCOUNTS, &[]).await.unwrap();
        pool
    }

    fn account(name: &str) -> Account {
        Account {
            id: None,
            name: name.into(),
            balance: Some(12.5),
            note: None,
            avatar: vec![0xde, 0xad, 0xbe, 0xef],
            active: true,
            audit: Audit {
                created_by: "admin".into(),
                revision: 2,
            },
        }
    }

    async fn all_accounts(pool: &AnyPool) -> Vec<Account> {
        let mut db = Db::postgres(pool.clone());
        let accounts = db.select("SELECT * FROM accounts ORDER BY id", &[]).await.unwrap();
        db.close(false).await.unwrap();
        accounts
    }

    #[tokio::test]
    async fn test_insert_then_select_round_trip() {
        let pool = memory_pool().await;
        let original = account("alice");

        let mut db = Db::postgres(pool.clone());
        let result = db.insert(&original, "accounts").await.unwrap();
        assert_eq!(result.rows_affected(), 1);
        db.close(true).await.unwrap();

        let accounts = all_accounts(&pool).await;
        assert_eq!(accounts.len(), 1);
        let stored = &accounts[0];
        assert!(stored.id.is_some());
        assert_eq!(stored.name, original.name);
        assert_eq!(stored.balance, original.balance);
        assert_eq!(stored.avatar, original.avatar);
        assert_eq!(stored.active, original.active);
        assert_eq!(stored.audit, original.audit);
    }

    #[tokio::test]
    async fn test_null_insensitive_insert_leaves_column_default() {
        let pool = memory_pool().await;

        let mut db = Db::postgres(pool.clone());
        db.insert(&account("skip"), "accounts").await.unwrap();
        db.close(true).await.unwrap();

        let mut db = Db::postgres(pool.clone()).null_sensitive();
        db.insert(&account("write"), "accounts").await.unwrap();
        db.close(true).await.unwrap();

        let accounts = all_accounts(&pool).await;
        assert_eq!(accounts[0].note.as_deref(), Some("n/a"));
        assert_eq!(accounts[1].note, None);
    }

    #[tokio::test]
    async fn test_rollback_discards_changes() {
        let pool = memory_pool().await;

        let mut db = Db::postgres(pool.clone());
        db.insert(&account("ghost"), "accounts").await.unwrap();
        assert!(db.in_transaction());
        db.close(false).await.unwrap();

        assert!(all_accounts(&pool).await.is_empty());
    }

    #[tokio::test]
    async fn test_close_without_statements_is_noop() {
        let pool = memory_pool().await;
        let db = Db::postgres(pool);
        assert!(!db.in_transaction());
        db.close(true).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_and_delete_by_primary_key() {
        let pool = memory_pool().await;

        let mut db = Db::postgres(pool.clone());
        db.insert(&account("alice"), "accounts").await.unwrap();
        db.insert(&account("bob"), "accounts").await.unwrap();
        let mut accounts: Vec<Account> = db
            .select("select * from accounts where name = $1", &params!["alice"])
            .await
            .unwrap();
        let mut alice = accounts.remove(0);
        alice.balance = Some(99.0);
        alice.note = Some("vip".into());
        let result = db.update(&alice, "accounts").await.unwrap();
        assert_eq!(result.rows_affected(), 1);
        db.close(true).await.unwrap();

        let accounts = all_accounts(&pool).await;
        assert_eq!(accounts[0].balance, Some(99.0));
        assert_eq!(accounts[0].note.as_deref(), Some("vip"));
        assert_eq!(accounts[1].balance, Some(12.5));

        let mut db = Db::postgres(pool.clone());
        let result = db.delete(&accounts[1], "accounts").await.unwrap();
        assert_eq!(result.rows_affected(), 1);
        db.close(true).await.unwrap();

        let names: Vec<_> = all_accounts(&pool).await.into_iter().map(|a| a.name).collect();
        assert_eq!(names, ["alice"]);
    }

    #[tokio::test]
    async fn test_update_and_delete_need_primary_key_value() {
        let pool = memory_pool().await;
        let mut db = Db::postgres(pool);

        let err = db.update(&account("nobody"), "accounts").await.unwrap_err();
        assert!(matches!(err, Error::MissingPrimaryKey { operation: "update", .. }));
        let err = db.delete(&account("nobody"), "accounts").await.unwrap_err();
        assert!(matches!(err, Error::MissingPrimaryKey { operation: "delete", .. }));
        assert!(!db.in_transaction());
    }

    #[tokio::test]
    async fn test_several_primary_keys_are_rejected_before_running() {
        let pool = memory_pool().await;
        let mut db = Db::postgres(pool);
        let record = TwoKeys { a: 1, b: 2 };

        let err = db.insert(&record, "pairs").await.unwrap_err();
        assert!(matches!(err, Error::AmbiguousPrimaryKey { record: "TwoKeys", .. }));
        let err = db.update(&record, "pairs").await.unwrap_err();
        assert!(matches!(err, Error::AmbiguousPrimaryKey { record: "TwoKeys", .. }));
        let err = db.delete(&record, "pairs").await.unwrap_err();
        assert!(matches!(err, Error::AmbiguousPrimaryKey { record: "TwoKeys", .. }));
        assert!(!db.in_transaction());
    }

    #[tokio::test]
    async fn test_query_row_falls_back_to_pool_when_begin_fails() {
        let mut pool = memory_pool().await;
        // A transaction opened behind SQLx's back makes the next BEGIN fail.
        pool.exec("BEGIN", &[]).await.unwrap();

        let mut db = Db::postgres(pool.clone());
        let row = db.query_row("SELECT 7", &[]).await.unwrap().unwrap();
        assert_eq!(crate::row::decode_column(&row, 0).unwrap(), Value::Int(7));
        assert!(!db.in_transaction());

        pool.exec("ROLLBACK", &[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_boolean_fields_round_trip_through_integer_columns() {
        let pool = memory_pool().await;
        let mut db = Db::postgres(pool);
        let mut inactive = account("off");
        inactive.active = false;
        db.insert(&account("on"), "accounts").await.unwrap();
        db.insert(&inactive, "accounts").await.unwrap();

        let rows = db
            .select_maps("SELECT active FROM accounts ORDER BY id", &[])
            .await
            .unwrap();
        assert_eq!(rows[0]["active"], Value::Int(1));
        assert_eq!(rows[1]["active"], Value::Int(0));

        let accounts: Vec<Account> = db
            .select("SELECT * FROM accounts ORDER BY id", &[])
            .await
            .unwrap();
        assert!(accounts[0].active);
        assert!(!accounts[1].active);
        db.close(false).await.unwrap();
    }

    #[tokio::test]
    async fn test_select_into_leaves_out_untouched_on_error() {
        let pool = memory_pool().await;
        let mut db = Db::postgres(pool);
        let mut out: Vec<Account> = Vec::new();
        let err = db
            .select_into(&mut out, "SELECT '1' AS revision UNION ALL SELECT 'x'", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Column { .. }));
        assert!(out.is_empty());
        db.close(false).await.unwrap();
    }

    #[tokio::test]
    async fn test_select_maps_and_int() {
        let pool = memory_pool().await;
        let mut db = Db::postgres(pool);
        db.insert(&account("alice"), "accounts").await.unwrap();
        db.insert(&account("bob"), "accounts").await.unwrap();

        let count = db.select_int("SELECT count(*) FROM accounts", &[]).await.unwrap();
        assert_eq!(count, 2);

        let rows = db
            .select_maps("SELECT name, note FROM accounts WHERE name = $1", &params!["bob"])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], Value::Text("bob".into()));
        assert_eq!(rows[0]["note"], Value::Text("n/a".into()));

        let err = db
            .select_int("SELECT id FROM accounts WHERE name = $1", &params!["carol"])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Database(sqlx::Error::RowNotFound)));
        db.close(false).await.unwrap();
    }

    #[tokio::test]
    async fn test_select_into_appends_and_returns_maps() {
        let pool = memory_pool().await;
        let mut db = Db::postgres(pool);
        db.insert(&account("alice"), "accounts").await.unwrap();

        let mut out = vec![Account::default()];
        let rows = db
            .select_into(&mut out, "SELECT NAME, revision, unmapped FROM (SELECT name, revision, 1 AS unmapped FROM accounts)", &[])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].name, "alice");
        assert_eq!(out[1].audit.revision, 2);
        db.close(false).await.unwrap();
    }

    #[tokio::test]
    async fn test_select_conversion_error_names_column() {
        let pool = memory_pool().await;
        let mut db = Db::postgres(pool);
        let err = db
            .select::<Account>("SELECT 'abc' AS revision", &[])
            .await
            .unwrap_err();
        match err {
            Error::Column { column, record, source } => {
                assert_eq!(column, "revision");
                assert_eq!(record, "Account");
                assert!(matches!(*source, Error::Parse { target: "i32", .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_map_operations() {
        let pool = memory_pool().await;
        let mut db = Db::postgres(pool);
        let values = RowValue::from([
            ("name".to_owned(), Value::Text("map".into())),
            ("avatar".to_owned(), Value::Bytes(vec![1])),
            ("active".to_owned(), Value::Bool(false)),
            ("created_by".to_owned(), Value::Text("ops".into())),
            ("revision".to_owned(), Value::Int(1)),
        ]);
        db.insert_map(&values, "accounts").await.unwrap();

        let changes = RowValue::from([
            ("revision".to_owned(), Value::Int(5)),
            ("note".to_owned(), Value::Text("edited".into())),
        ]);
        let result = db
            .update_map(&changes, "accounts", "WHERE name = $1", &params!["map"])
            .await
            .unwrap();
        assert_eq!(result.rows_affected(), 1);

        let accounts: Vec<Account> = db.select("SELECT * FROM accounts", &[]).await.unwrap();
        assert_eq!(accounts[0].audit.revision, 5);
        assert_eq!(accounts[0].note.as_deref(), Some("edited"));
        assert!(!accounts[0].active);
        db.close(true).await.unwrap();
    }

    #[tokio::test]
    async fn test_sequence_failure_is_reported() {
        let pool = memory_pool().await;
        let mut db = Db::postgres(pool);
        let ticket = Ticket {
            id: None,
            title: "broken".into(),
        };
        let err = db.insert(&ticket, "tickets").await.unwrap_err();
        assert!(matches!(err, Error::Sequence { ref sequence, .. } if sequence == "ticket_seq"));
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL pointing at PostgreSQL"]
    async fn test_postgres_sequence_insert() {
        dotenvy::dotenv().ok();
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        sqlx::any::install_default_drivers();
        let mut pool = AnyPool::connect(&url).await.unwrap();
        pool.exec("DROP TABLE IF EXISTS tickets", &[]).await.unwrap();
        pool.exec("DROP SEQUENCE IF EXISTS ticket_seq", &[]).await.unwrap();
        pool.exec("CREATE SEQUENCE ticket_seq", &[]).await.unwrap();
        pool.exec("CREATE TABLE tickets (id BIGINT PRIMARY KEY, title TEXT)", &[])
            .await
            .unwrap();

        let mut db = Db::postgres(pool.clone());
        let ticket = Ticket {
            id: None,
            title: "first".into(),
        };
        db.insert(&ticket, "tickets").await.unwrap();
        let tickets: Vec<Ticket> = db.select("SELECT * FROM tickets", &[]).await.unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].id, Some(1));
        assert_eq!(tickets[0].title, "first");
        db.close(false).await.unwrap();
    }
}
