//! Field-to-column bindings, built once per record type.
//!
//! A [`Schema`] lists the columns a type maps to, which one is the primary
//! key, and how to read and assign each field. Types opt in by implementing
//! [`Record`]:
//!
//! ```
//! use std::sync::OnceLock;
//! use sqlx_dbutils::{Record, Schema};
//!
//! #[derive(Default)]
//! struct Audit {
//!     created_by: String,
//! }
//!
//! impl Record for Audit {
//!     fn schema() -> &'static Schema<Self> {
//!         static SCHEMA: OnceLock<Schema<Audit>> = OnceLock::new();
//!         SCHEMA.get_or_init(|| {
//!             Schema::<Audit>::builder("Audit")
//!                 .column("created_by", |a| &a.created_by, |a| &mut a.created_by)
//!                 .build()
//!         })
//!     }
//! }
//!
//! #[derive(Default)]
//! struct User {
//!     id: Option<i64>,
//!     name: String,
//!     email: Option<String>,
//!     audit: Audit,
//! }
//!
//! impl Record for User {
//!     fn schema() -> &'static Schema<Self> {
//!         static SCHEMA: OnceLock<Schema<User>> = OnceLock::new();
//!         SCHEMA.get_or_init(|| {
//!             Schema::<User>::builder("User")
//!                 .sequence("ID", "users_seq", |u| &u.id, |u| &mut u.id)
//!                 .column("name", |u| &u.name, |u| &mut u.name)
//!                 .column("email", |u| &u.email, |u| &mut u.email)
//!                 .embed(|u| &u.audit, |u| &mut u.audit)
//!                 .build()
//!         })
//!     }
//! }
//!
//! let schema = User::schema();
//! assert_eq!(schema.columns().collect::<Vec<_>>(), ["id", "name", "email", "created_by"]);
//! assert_eq!(schema.primary().unwrap().unwrap().sequence(), Some("users_seq"));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::convert::{FromValue, ToValue};
use crate::error::{Error, Result};
use crate::value::{Param, Value, ValueKind};

type Getter<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;
type Setter<T> = Arc<dyn Fn(&mut T, &Value) -> Result<()> + Send + Sync>;

/// A type whose fields map to table columns.
pub trait Record: Default + Send + Sync + 'static {
    /// The type's bindings, built once and reused by every operation.
    fn schema() -> &'static Schema<Self>;
}

/// How a field participates in the primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Key {
    None,
    /// Generated by the database, left out of inserts.
    Generated,
    /// Fetched from the named sequence before each insert.
    Sequence(String),
}

/// One mapped column of `T`.
pub struct Field<T> {
    column: String,
    key: Key,
    kind: ValueKind,
    get: Getter<T>,
    set: Setter<T>,
}

impl<T> Field<T> {
    /// Lowercased column name.
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn sequence(&self) -> Option<&str> {
        match &self.key {
            Key::Sequence(name) => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn is_primary(&self) -> bool {
        self.key != Key::None
    }

    /// Declared kind of the field, used to type `NULL` binds.
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Current value of the field in `record`.
    pub fn get(&self, record: &T) -> Value {
        (self.get)(record)
    }

    /// The field's value as a bind parameter.
    pub fn param(&self, record: &T) -> Param {
        Param::typed(self.get(record), self.kind)
    }

    /// Assigns a scanned value to the field.
    pub fn set(&self, record: &mut T, value: &Value) -> Result<()> {
        (self.set)(record, value)
    }
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        Self {
            column: self.column.clone(),
            key: self.key.clone(),
            kind: self.kind,
            get: Arc::clone(&self.get),
            set: Arc::clone(&self.set),
        }
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("column", &self.column)
            .field("key", &self.key)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// The column bindings of a record type.
pub struct Schema<T> {
    name: &'static str,
    fields: Vec<Field<T>>,
    index: HashMap<String, usize>,
}

impl<T: 'static> Schema<T> {
    pub fn builder(name: &'static str) -> SchemaBuilder<T> {
        SchemaBuilder {
            name,
            fields: Vec::new(),
        }
    }
}

impl<T> Schema<T> {
    /// Name of the record type, used in error messages.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[Field<T>] {
        &self.fields
    }

    /// Column names in registration order.
    pub fn columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(Field::column)
    }

    /// Looks up a field by column name, ignoring case.
    pub fn field(&self, column: &str) -> Option<&Field<T>> {
        let found = match self.index.get(column) {
            Some(&i) => Some(i),
            None => self.index.get(&column.to_lowercase()).copied(),
        };
        found.map(|i| &self.fields[i])
    }

    /// The primary key field, if one was declared.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AmbiguousPrimaryKey`] when more than one field was
    /// declared as the key.
    pub fn primary(&self) -> Result<Option<&Field<T>>> {
        let mut keys = self.fields.iter().filter(|f| f.is_primary());
        let first = keys.next();
        if let (Some(first), Some(second)) = (first, keys.next()) {
            return Err(Error::AmbiguousPrimaryKey {
                record: self.name,
                first: first.column.clone(),
                second: second.column.clone(),
            });
        }
        Ok(first)
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Registers the fields of a [`Schema`].
pub struct SchemaBuilder<T> {
    name: &'static str,
    fields: Vec<Field<T>>,
}

impl<T: 'static> SchemaBuilder<T> {
    /// Maps a field to `column`.
    pub fn column<V, G, S>(self, column: &str, get: G, get_mut: S) -> Self
    where
        V: ToValue + FromValue + 'static,
        G: Fn(&T) -> &V + Send + Sync + 'static,
        S: Fn(&mut T) -> &mut V + Send + Sync + 'static,
    {
        self.push_lens(column, Key::None, get, get_mut)
    }

    /// Maps the primary key, whose insert value comes from `sequence`.
    pub fn sequence<V, G, S>(self, column: &str, sequence: &str, get: G, get_mut: S) -> Self
    where
        V: ToValue + FromValue + 'static,
        G: Fn(&T) -> &V + Send + Sync + 'static,
        S: Fn(&mut T) -> &mut V + Send + Sync + 'static,
    {
        self.push_lens(column, Key::Sequence(sequence.to_owned()), get, get_mut)
    }

    /// Maps a primary key the database generates itself.
    pub fn key<V, G, S>(self, column: &str, get: G, get_mut: S) -> Self
    where
        V: ToValue + FromValue + 'static,
        G: Fn(&T) -> &V + Send + Sync + 'static,
        S: Fn(&mut T) -> &mut V + Send + Sync + 'static,
    {
        self.push_lens(column, Key::Generated, get, get_mut)
    }

    /// Flattens the columns of an embedded record into this schema.
    pub fn embed<U, G, S>(mut self, get: G, get_mut: S) -> Self
    where
        U: Record,
        G: Fn(&T) -> &U + Send + Sync + 'static,
        S: Fn(&mut T) -> &mut U + Send + Sync + 'static,
    {
        let get = Arc::new(get);
        let get_mut = Arc::new(get_mut);
        for inner in U::schema().fields() {
            let (outer, inner_get) = (Arc::clone(&get), Arc::clone(&inner.get));
            let (outer_mut, inner_set) = (Arc::clone(&get_mut), Arc::clone(&inner.set));
            self = self.push(Field {
                column: inner.column.clone(),
                key: inner.key.clone(),
                kind: inner.kind,
                get: Arc::new(move |t: &T| inner_get(outer(t))),
                set: Arc::new(move |t: &mut T, value: &Value| inner_set(outer_mut(t), value)),
            });
        }
        self
    }

    pub fn build(self) -> Schema<T> {
        let index = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, field)| (field.column.clone(), i))
            .collect();
        Schema {
            name: self.name,
            fields: self.fields,
            index,
        }
    }

    fn push_lens<V, G, S>(self, column: &str, key: Key, get: G, get_mut: S) -> Self
    where
        V: ToValue + FromValue + 'static,
        G: Fn(&T) -> &V + Send + Sync + 'static,
        S: Fn(&mut T) -> &mut V + Send + Sync + 'static,
    {
        self.push(Field {
            column: column.to_lowercase(),
            key,
            kind: V::KIND,
            get: Arc::new(move |t: &T| get(t).to_value()),
            set: Arc::new(move |t: &mut T, value: &Value| {
                *get_mut(t) = V::from_value(value)?;
                Ok(())
            }),
        })
    }

    /// A repeated column replaces the earlier binding in place.
    fn push(mut self, field: Field<T>) -> Self {
        match self.fields.iter_mut().find(|f| f.column == field.column) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }
}
