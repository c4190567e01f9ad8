//! Conversions between [`Value`] and the Rust types records are made of.

use std::fmt::Display;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::value::{Value, ValueKind};

/// Stores a scanned [`Value`] into a typed destination.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self>;
}

/// Reads a typed field back into a [`Value`] for binding.
pub trait ToValue {
    /// Kind a `NULL` of this type binds as.
    const KIND: ValueKind;

    fn to_value(&self) -> Value;
}

fn unsupported(value: &Value, target: &'static str) -> Error {
    Error::UnsupportedConversion {
        source_type: value.type_name(),
        target,
    }
}

/// Parses the textual form of `value`, the fallback for numeric and boolean
/// destinations.
fn parse_text<T>(value: &Value, target: &'static str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    if value.is_null() {
        return Err(unsupported(value, target));
    }
    let text = value.as_text();
    text.parse::<T>().map_err(|err| Error::Parse {
        source_type: value.type_name(),
        text: text.clone().into_owned(),
        target,
        reason: err.to_string(),
    })
}

macro_rules! impl_integer {
    ($($ty:ty),*) => {$(
        impl FromValue for $ty {
            fn from_value(value: &Value) -> Result<Self> {
                parse_text(value, stringify!($ty))
            }
        }
    )*};
}

impl_integer!(i8, i16, i32, u8, u16, u32, u64);

macro_rules! impl_to_int {
    ($($ty:ty),*) => {$(
        impl ToValue for $ty {
            const KIND: ValueKind = ValueKind::Int;

            fn to_value(&self) -> Value {
                Value::Int(i64::from(*self))
            }
        }
    )*};
}

impl_to_int!(i8, i16, i32, i64, u8, u16, u32);

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Int(i) => Ok(*i),
            other => parse_text(other, "i64"),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Float(f) => Ok(*f),
            other => parse_text(other, "f64"),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self> {
        parse_text(value, "f32")
    }
}

impl ToValue for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl ToValue for f32 {
    const KIND: ValueKind = ValueKind::Float;

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

fn parse_bool(value: &Value) -> Result<bool> {
    if value.is_null() {
        return Err(unsupported(value, "bool"));
    }
    let text = value.as_text();
    match text.as_ref() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(Error::Parse {
            source_type: value.type_name(),
            text: text.into_owned(),
            target: "bool",
            reason: "invalid syntax".to_owned(),
        }),
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => parse_bool(other),
        }
    }
}

impl ToValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            Value::Bytes(b) => Ok(String::from_utf8_lossy(b).into_owned()),
            other => Err(unsupported(other, "String")),
        }
    }
}

impl ToValue for String {
    const KIND: ValueKind = ValueKind::Text;

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            // A fresh buffer, never shared with the scanned row.
            Value::Bytes(b) => Ok(b.clone()),
            other => Err(unsupported(other, "Vec<u8>")),
        }
    }
}

impl ToValue for Vec<u8> {
    const KIND: ValueKind = ValueKind::Bytes;

    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: ToValue> ToValue for Option<T> {
    const KIND: ValueKind = T::KIND;

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, ToValue::to_value)
    }
}

/// Values above `i64::MAX` are written as text.
impl ToValue for u64 {
    const KIND: ValueKind = ValueKind::Int;

    fn to_value(&self) -> Value {
        i64::try_from(*self).map_or_else(|_| Value::Text(self.to_string()), Value::Int)
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

/// A raw `Value` field; `NULL` binds as text.
impl ToValue for Value {
    const KIND: ValueKind = ValueKind::Text;

    fn to_value(&self) -> Value {
        self.clone()
    }
}
