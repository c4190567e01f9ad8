use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// One result row: column name (as reported by the driver) to scanned value.
pub type RowValue = HashMap<String, Value>;

/// A column value as read from, or written to, the database.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

/// The kind of a non-null [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Text,
    Bytes,
}

impl Value {
    /// Kind of this value, `None` for `Null`.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ValueKind::Bool),
            Value::Int(_) => Some(ValueKind::Int),
            Value::Float(_) => Some(ValueKind::Float),
            Value::Text(_) => Some(ValueKind::Text),
            Value::Bytes(_) => Some(ValueKind::Bytes),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// SQL-flavoured type name used in conversion errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::Int(_) => "INTEGER",
            Value::Float(_) => "FLOAT",
            Value::Text(_) => "TEXT",
            Value::Bytes(_) => "BLOB",
        }
    }

    /// Textual representation used by string-mediated conversions.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Value::Null => Cow::Borrowed("NULL"),
            Value::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            Value::Int(i) => Cow::Owned(i.to_string()),
            Value::Float(f) => Cow::Owned(f.to_string()),
            Value::Text(s) => Cow::Borrowed(s.as_str()),
            Value::Bytes(b) => String::from_utf8_lossy(b),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            other => f.write_str(&other.as_text()),
        }
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {$(
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::Int(i64::from(v))
            }
        }
    )*};
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A bind parameter.
///
/// The optional kind lets a `NULL` be bound with a concrete type, which
/// PostgreSQL needs for non-text columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    value: Value,
    hint: Option<ValueKind>,
}

impl Param {
    pub fn new(value: Value) -> Self {
        Self { value, hint: None }
    }

    /// A parameter whose `NULL` binds as the given kind.
    pub fn typed(value: Value, kind: ValueKind) -> Self {
        Self {
            value,
            hint: Some(kind),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The value's own kind, or the hint when the value is `NULL`.
    pub fn kind(&self) -> Option<ValueKind> {
        self.value.kind().or(self.hint)
    }
}

impl From<Value> for Param {
    fn from(v: Value) -> Self {
        Param::new(v)
    }
}

macro_rules! impl_param_from {
    ($($ty:ty),*) => {$(
        impl From<$ty> for Param {
            fn from(v: $ty) -> Self {
                Param::new(Value::from(v))
            }
        }

        impl From<Option<$ty>> for Param {
            fn from(v: Option<$ty>) -> Self {
                Param::new(Value::from(v))
            }
        }
    )*};
}

impl_param_from!(bool, i8, i16, i32, i64, u8, u16, u32, f32, f64, String, Vec<u8>);

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::new(Value::from(v))
    }
}

impl From<&[u8]> for Param {
    fn from(v: &[u8]) -> Self {
        Param::new(Value::from(v))
    }
}

/// Builds a `Vec<Param>` from a list of values.
///
/// ```
/// use sqlx_dbutils::{params, Value};
///
/// let params = params![42, "alice", None::<i64>];
/// assert_eq!(params.len(), 3);
/// assert_eq!(params[1].value(), &Value::Text("alice".into()));
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::Param>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Param::from($value)),+]
    };
}
