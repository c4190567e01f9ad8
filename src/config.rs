//! Connection configuration.

use std::time::Duration;

use sqlx::any::AnyPoolOptions;
use tracing::debug;

use crate::db::Db;
use crate::dialect::Dialect;
use crate::error::{Error, Result};

/// Settings for opening a [`Db`].
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database connection URL
    pub url: String,
    /// Placeholder dialect (detected from the URL)
    pub dialect: Dialect,
    /// Maximum number of pooled connections
    pub max_connections: u32,
    /// How long to wait for a pooled connection
    pub acquire_timeout: Duration,
    /// Write `NULL` fields on insert and update
    pub null_sensitive: bool,
}

impl DbConfig {
    /// Configuration for `url`, with the dialect picked from its scheme.
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlx_dbutils::{DbConfig, Dialect};
    ///
    /// let config = DbConfig::from_url("postgres://localhost/app")?;
    /// assert_eq!(config.dialect, Dialect::Postgres);
    /// assert_eq!(config.max_connections, 10);
    /// # Ok::<(), sqlx_dbutils::Error>(())
    /// ```
    pub fn from_url(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let dialect = Dialect::from_url(&url)?;
        Ok(Self {
            url,
            dialect,
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
            null_sensitive: false,
        })
    }

    /// Configuration from the `DATABASE_URL` environment variable.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("DATABASE_URL")
            .map_err(|_| Error::Config("DATABASE_URL is not set".to_owned()))?;
        Self::from_url(url)
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn with_null_sensitive(mut self, null_sensitive: bool) -> Self {
        self.null_sensitive = null_sensitive;
        self
    }

    /// Opens a pool and wraps it in a [`Db`].
    ///
    /// Installs SQLx's compiled-in `Any` drivers first.
    pub async fn connect(&self) -> Result<Db> {
        sqlx::any::install_default_drivers();
        if self.max_connections == 0 {
            return Err(Error::Config("max_connections must be at least 1".to_owned()));
        }
        let pool = AnyPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .connect(&self.url)
            .await?;
        debug!(dialect = ?self.dialect, max_connections = self.max_connections, "Connected");

        let mut db = Db::new(pool, self.dialect);
        db.set_null_sensitive(self.null_sensitive);
        Ok(db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_methods() {
        let config = DbConfig::from_url("sqlite::memory:")
            .unwrap()
            .with_dialect(Dialect::Oracle)
            .with_max_connections(2)
            .with_acquire_timeout(Duration::from_secs(1))
            .with_null_sensitive(true);
        assert_eq!(config.dialect, Dialect::Oracle);
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.acquire_timeout, Duration::from_secs(1));
        assert!(config.null_sensitive);
    }

    #[test]
    fn test_unknown_scheme() {
        assert!(matches!(
            DbConfig::from_url("mssql://localhost"),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_sqlite() {
        let config = DbConfig::from_url("sqlite::memory:")
            .unwrap()
            .with_max_connections(1)
            .with_null_sensitive(true);
        let mut db = config.connect().await.unwrap();
        assert!(db.is_null_sensitive());
        assert_eq!(db.dialect(), Dialect::Postgres);
        assert_eq!(db.select_int("SELECT 40 + 2", &[]).await.unwrap(), 42);
        db.close(true).await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_rejects_empty_pool() {
        let config = DbConfig::from_url("sqlite::memory:")
            .unwrap()
            .with_max_connections(0);
        assert!(matches!(config.connect().await, Err(Error::Config(_))));
    }
}
