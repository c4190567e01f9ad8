//! # sqlx-dbutils
//!
//! Struct-to-table helpers on top of SQLx's `Any` driver: select rows into
//! plain structs, insert/update/delete them by primary key, and run it all
//! inside a lazily started transaction.
//!
//! ## Features
//!
//! - **Explicit Schemas**: Each type declares its columns once through [`Record`]; no derive or reflection
//! - **Embedded Records**: Nested structs flatten their columns into the parent
//! - **Sequence Keys**: Primary keys can be filled from a database sequence on insert
//! - **Lazy Transactions**: [`Db`] begins a transaction on first use and commits or rolls back on [`Db::close`]
//! - **Dialects**: `$1` (PostgreSQL) and `:1` (Oracle) positional placeholders
//! - **NULL Sensitivity**: Choose whether `NULL` fields are written or left to column defaults
//!
//! ## Quick Start
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! sqlx-dbutils = { version = "0.1", features = ["postgres", "runtime-tokio"] }
//! ```
//!
//! ## Examples
//!
//! ### Declaring a Record
//!
//! ```rust
//! use std::sync::OnceLock;
//! use sqlx_dbutils::{Record, Schema};
//!
//! #[derive(Debug, Default)]
//! struct User {
//!     id: Option<i64>,
//!     name: String,
//!     email: Option<String>,
//! }
//!
//! impl Record for User {
//!     fn schema() -> &'static Schema<Self> {
//!         static SCHEMA: OnceLock<Schema<User>> = OnceLock::new();
//!         SCHEMA.get_or_init(|| {
//!             Schema::<User>::builder("User")
//!                 .sequence("id", "users_seq", |u| &u.id, |u| &mut u.id)
//!                 .column("name", |u| &u.name, |u| &mut u.name)
//!                 .column("email", |u| &u.email, |u| &mut u.email)
//!                 .build()
//!         })
//!     }
//! }
//! ```
//!
//! ### Reading and Writing
//!
//! ```rust,no_run
//! # use std::sync::OnceLock;
//! # use sqlx_dbutils::{Record, Schema};
//! # #[derive(Debug, Default)]
//! # struct User { id: Option<i64>, name: String }
//! # impl Record for User {
//! #     fn schema() -> &'static Schema<Self> {
//! #         static SCHEMA: OnceLock<Schema<User>> = OnceLock::new();
//! #         SCHEMA.get_or_init(|| {
//! #             Schema::<User>::builder("User")
//! #                 .sequence("id", "users_seq", |u| &u.id, |u| &mut u.id)
//! #                 .column("name", |u| &u.name, |u| &mut u.name)
//! #                 .build()
//! #         })
//! #     }
//! # }
//! use sqlx_dbutils::{params, DbConfig};
//!
//! # async fn example() -> Result<(), sqlx_dbutils::Error> {
//! let mut db = DbConfig::from_url("postgres://localhost/app")?.connect().await?;
//!
//! let user = User { id: None, name: "alice".into() };
//! db.insert(&user, "users").await?;
//!
//! let users: Vec<User> = db
//!     .select("SELECT * FROM users WHERE name = $1", &params!["alice"])
//!     .await?;
//!
//! let mut user = users.into_iter().next().expect("just inserted");
//! user.name = "alice b.".into();
//! db.update(&user, "users").await?;
//!
//! db.close(true).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Column Maps
//!
//! ```rust,no_run
//! use sqlx_dbutils::{DbConfig, RowValue, Value};
//!
//! # async fn example() -> Result<(), sqlx_dbutils::Error> {
//! let mut db = DbConfig::from_env()?.connect().await?;
//!
//! let mut values = RowValue::new();
//! values.insert("name".into(), Value::from("bob"));
//! db.insert_map(&values, "users").await?;
//!
//! let count = db.select_int("SELECT COUNT(*) FROM users", &[]).await?;
//! println!("{count} users");
//! db.close(true).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## How It Works
//!
//! 1. **Describe**: A [`Schema`] records, per field, its column name, key role and a getter/setter pair
//! 2. **Build**: Statements are assembled from the schema, with positional placeholders in the chosen [`Dialect`]
//! 3. **Bind**: Field values become [`Param`]s; `NULL`s carry the field's [`ValueKind`] so they bind with a type
//! 4. **Scan**: Result rows are decoded into [`Value`]s and assigned back through [`FromValue`]
//!
//! Every operation returns [`Result`]. Code that prefers to fail loudly can
//! call [`OrPanic::or_panic`] at the call site.
//!
//! ## Limitations
//!
//! - The Oracle dialect only affects generated SQL; SQLx ships no Oracle driver
//! - Column types outside booleans, integers, floats, text and bytes are not decoded
//! - SQLite `BOOLEAN` columns cannot be read through `Any`; declare them `INTEGER` (booleans parse from `0`/`1`)
//!
//! ## License
//!
//! Licensed under either of Apache License, Version 2.0 or MIT license at your option.

pub mod builder;
pub mod config;
pub mod convert;
pub mod db;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod ops;
pub mod query;
pub mod row;
pub mod schema;
pub mod unchecked;
pub mod value;

pub use builder::Statement;
pub use config::DbConfig;
pub use convert::{FromValue, ToValue};
pub use db::Db;
pub use dialect::Dialect;
pub use error::{Error, Result};
pub use executor::SqlExecutor;
pub use schema::{Field, Record, Schema, SchemaBuilder};
pub use unchecked::OrPanic;
pub use value::{Param, RowValue, Value, ValueKind};

/// Convenience re-exports for common use cases
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::params;
    pub use crate::{Db, DbConfig, Dialect, OrPanic, Param, Record, Schema, SqlExecutor, Value};
}
