//! SQL values and the conversions generated code relies on
//!
//! `SqlValue` is the single currency between generated code and an
//! executor. Arguments go in through `ToSql`, row values come out through
//! `FromSql`; executors only translate `SqlValue` to and from their driver.

use super::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A value bound to or read from a statement
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(JsonValue),
    Uuid(Uuid),
    Decimal(Decimal),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Array(Vec<SqlValue>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Short name of the variant, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Bool(_) => "bool",
            SqlValue::Int(_) => "int",
            SqlValue::Float(_) => "float",
            SqlValue::Text(_) => "text",
            SqlValue::Bytes(_) => "bytes",
            SqlValue::Json(_) => "json",
            SqlValue::Uuid(_) => "uuid",
            SqlValue::Decimal(_) => "decimal",
            SqlValue::Date(_) => "date",
            SqlValue::Time(_) => "time",
            SqlValue::Timestamp(_) => "timestamp",
            SqlValue::TimestampTz(_) => "timestamptz",
            SqlValue::Array(_) => "array",
        }
    }

    /// JSON form, used by backends without native arrays
    pub fn to_json(&self) -> JsonValue {
        match self {
            SqlValue::Null => JsonValue::Null,
            SqlValue::Bool(b) => JsonValue::Bool(*b),
            SqlValue::Int(i) => JsonValue::from(*i),
            SqlValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            SqlValue::Text(s) => JsonValue::String(s.clone()),
            SqlValue::Bytes(b) => JsonValue::Array(b.iter().map(|byte| JsonValue::from(*byte)).collect()),
            SqlValue::Json(j) => j.clone(),
            SqlValue::Uuid(u) => JsonValue::String(u.to_string()),
            SqlValue::Decimal(d) => JsonValue::String(d.to_string()),
            SqlValue::Date(d) => JsonValue::String(d.to_string()),
            SqlValue::Time(t) => JsonValue::String(t.to_string()),
            SqlValue::Timestamp(ts) => JsonValue::String(ts.to_string()),
            SqlValue::TimestampTz(ts) => JsonValue::String(ts.to_rfc3339()),
            SqlValue::Array(items) => JsonValue::Array(items.iter().map(SqlValue::to_json).collect()),
        }
    }

    pub fn from_json(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => SqlValue::Null,
            JsonValue::Bool(b) => SqlValue::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::Int(i),
                None => SqlValue::Float(n.as_f64().unwrap_or_default()),
            },
            JsonValue::String(s) => SqlValue::Text(s),
            JsonValue::Array(items) => {
                SqlValue::Array(items.into_iter().map(SqlValue::from_json).collect())
            }
            object @ JsonValue::Object(_) => SqlValue::Json(object),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            SqlValue::Bytes(b) => write!(f, "<{} byte(s)>", b.len()),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

/// Encode a Rust value as a statement argument
pub trait ToSql {
    fn to_sql(&self) -> SqlValue;
}

/// Decode a Rust value from a row value
pub trait FromSql: Sized {
    fn from_sql(value: &SqlValue) -> Result<Self>;
}

/// Element types allowed inside `Vec<T>` arrays
///
/// `u8` is deliberately absent: `Vec<u8>` is a byte string.
pub trait SqlArrayElement {}

fn mismatch<T>(expected: &str, value: &SqlValue) -> Result<T> {
    Err(Error::decode(format!(
        "expected {}, found {}",
        expected,
        value.type_name()
    )))
}

impl<T: ToSql + ?Sized> ToSql for &T {
    fn to_sql(&self) -> SqlValue {
        (**self).to_sql()
    }
}

impl<T: ToSql> ToSql for Option<T> {
    fn to_sql(&self) -> SqlValue {
        match self {
            Some(value) => value.to_sql(),
            None => SqlValue::Null,
        }
    }
}

impl<T: FromSql> FromSql for Option<T> {
    fn from_sql(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Null => Ok(None),
            other => T::from_sql(other).map(Some),
        }
    }
}

macro_rules! integer_sql {
    ($($ty:ty),*) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> SqlValue {
                    match i64::try_from(*self) {
                        Ok(value) => SqlValue::Int(value),
                        Err(_) => SqlValue::Text(self.to_string()),
                    }
                }
            }

            impl FromSql for $ty {
                fn from_sql(value: &SqlValue) -> Result<Self> {
                    match value {
                        SqlValue::Int(i) => <$ty>::try_from(*i).map_err(|_| {
                            Error::decode(format!("{} is out of range for {}", i, stringify!($ty)))
                        }),
                        SqlValue::Bool(b) => Ok(<$ty>::from(*b)),
                        SqlValue::Text(s) => s.trim().parse::<$ty>().map_err(|e| {
                            Error::decode(format!("'{}' is not a valid {}: {}", s, stringify!($ty), e))
                        }),
                        other => mismatch(stringify!($ty), other),
                    }
                }
            }
        )*
    };
}

integer_sql!(i8, i16, i32, i64, u8, u16, u32, u64);

impl SqlArrayElement for i8 {}
impl SqlArrayElement for i16 {}
impl SqlArrayElement for i32 {}
impl SqlArrayElement for i64 {}
impl SqlArrayElement for u16 {}
impl SqlArrayElement for u32 {}
impl SqlArrayElement for u64 {}

impl ToSql for f64 {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Float(*self)
    }
}

impl FromSql for f64 {
    fn from_sql(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Float(f) => Ok(*f),
            SqlValue::Int(i) => Ok(*i as f64),
            SqlValue::Text(s) => s
                .trim()
                .parse()
                .map_err(|e| Error::decode(format!("'{}' is not a valid float: {}", s, e))),
            other => mismatch("float", other),
        }
    }
}

impl ToSql for f32 {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Float(f64::from(*self))
    }
}

impl FromSql for f32 {
    fn from_sql(value: &SqlValue) -> Result<Self> {
        f64::from_sql(value).map(|f| f as f32)
    }
}

impl SqlArrayElement for f32 {}
impl SqlArrayElement for f64 {}

impl ToSql for bool {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Bool(*self)
    }
}

impl FromSql for bool {
    fn from_sql(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Bool(b) => Ok(*b),
            SqlValue::Int(i) => Ok(*i != 0),
            SqlValue::Text(s) => match s.to_ascii_lowercase().as_str() {
                "t" | "true" | "1" => Ok(true),
                "f" | "false" | "0" => Ok(false),
                _ => Err(Error::decode(format!("'{}' is not a valid bool", s))),
            },
            other => mismatch("bool", other),
        }
    }
}

impl SqlArrayElement for bool {}

impl ToSql for str {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Text(self.to_string())
    }
}

impl ToSql for String {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Text(self.clone())
    }
}

impl FromSql for String {
    fn from_sql(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Text(s) => Ok(s.clone()),
            SqlValue::Bytes(b) => String::from_utf8(b.clone())
                .map_err(|e| Error::decode(format!("invalid UTF-8 text: {}", e))),
            other => mismatch("text", other),
        }
    }
}

impl SqlArrayElement for String {}

impl ToSql for Vec<u8> {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Bytes(self.clone())
    }
}

impl FromSql for Vec<u8> {
    fn from_sql(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Bytes(b) => Ok(b.clone()),
            SqlValue::Text(s) => Ok(s.as_bytes().to_vec()),
            other => mismatch("bytes", other),
        }
    }
}

impl SqlArrayElement for Vec<u8> {}

impl<T: ToSql + SqlArrayElement> ToSql for Vec<T> {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Array(self.iter().map(ToSql::to_sql).collect())
    }
}

impl<T: FromSql + SqlArrayElement> FromSql for Vec<T> {
    fn from_sql(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Array(items) => items.iter().map(T::from_sql).collect(),
            // Backends without arrays store them as JSON text
            SqlValue::Text(s) | SqlValue::Json(JsonValue::String(s)) => {
                let parsed: JsonValue = serde_json::from_str(s)
                    .map_err(|e| Error::decode(format!("invalid array text: {}", e)))?;
                Vec::<T>::from_sql(&SqlValue::from_json(parsed))
            }
            SqlValue::Json(json @ JsonValue::Array(_)) => {
                Vec::<T>::from_sql(&SqlValue::from_json(json.clone()))
            }
            other => mismatch("array", other),
        }
    }
}

impl ToSql for Uuid {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Uuid(*self)
    }
}

impl FromSql for Uuid {
    fn from_sql(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Uuid(u) => Ok(*u),
            SqlValue::Text(s) => Uuid::parse_str(s)
                .map_err(|e| Error::decode(format!("'{}' is not a valid uuid: {}", s, e))),
            SqlValue::Bytes(b) => Uuid::from_slice(b)
                .map_err(|e| Error::decode(format!("invalid uuid bytes: {}", e))),
            other => mismatch("uuid", other),
        }
    }
}

impl SqlArrayElement for Uuid {}

impl ToSql for Decimal {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Decimal(*self)
    }
}

impl FromSql for Decimal {
    fn from_sql(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Decimal(d) => Ok(*d),
            SqlValue::Int(i) => Ok(Decimal::from(*i)),
            SqlValue::Float(f) => Decimal::from_f64(*f)
                .ok_or_else(|| Error::decode(format!("{} cannot be represented as a decimal", f))),
            SqlValue::Text(s) => Decimal::from_str(s.trim())
                .map_err(|e| Error::decode(format!("'{}' is not a valid decimal: {}", s, e))),
            other => mismatch("decimal", other),
        }
    }
}

impl SqlArrayElement for Decimal {}

impl ToSql for NaiveDate {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Date(*self)
    }
}

impl FromSql for NaiveDate {
    fn from_sql(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Date(d) => Ok(*d),
            SqlValue::Timestamp(ts) => Ok(ts.date()),
            SqlValue::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map_err(|e| Error::decode(format!("'{}' is not a valid date: {}", s, e))),
            other => mismatch("date", other),
        }
    }
}

impl SqlArrayElement for NaiveDate {}

impl ToSql for NaiveTime {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Time(*self)
    }
}

impl FromSql for NaiveTime {
    fn from_sql(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Time(t) => Ok(*t),
            SqlValue::Text(s) => NaiveTime::parse_from_str(s.trim(), "%H:%M:%S%.f")
                .map_err(|e| Error::decode(format!("'{}' is not a valid time: {}", s, e))),
            other => mismatch("time", other),
        }
    }
}

impl SqlArrayElement for NaiveTime {}

fn parse_naive_timestamp(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .map_err(|e| Error::decode(format!("'{}' is not a valid timestamp: {}", s, e)))
}

impl ToSql for NaiveDateTime {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Timestamp(*self)
    }
}

impl FromSql for NaiveDateTime {
    fn from_sql(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Timestamp(ts) => Ok(*ts),
            SqlValue::TimestampTz(ts) => Ok(ts.naive_utc()),
            SqlValue::Text(s) => parse_naive_timestamp(s),
            other => mismatch("timestamp", other),
        }
    }
}

impl SqlArrayElement for NaiveDateTime {}

impl ToSql for DateTime<Utc> {
    fn to_sql(&self) -> SqlValue {
        SqlValue::TimestampTz(*self)
    }
}

impl FromSql for DateTime<Utc> {
    fn from_sql(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::TimestampTz(ts) => Ok(*ts),
            SqlValue::Timestamp(ts) => Ok(Utc.from_utc_datetime(ts)),
            SqlValue::Text(s) => match DateTime::parse_from_rfc3339(s.trim()) {
                Ok(ts) => Ok(ts.with_timezone(&Utc)),
                Err(_) => parse_naive_timestamp(s).map(|ts| Utc.from_utc_datetime(&ts)),
            },
            other => mismatch("timestamptz", other),
        }
    }
}

impl SqlArrayElement for DateTime<Utc> {}

impl ToSql for JsonValue {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Json(self.clone())
    }
}

impl FromSql for JsonValue {
    fn from_sql(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Json(j) => Ok(j.clone()),
            SqlValue::Text(s) => serde_json::from_str(s)
                .map_err(|e| Error::decode(format!("invalid json: {}", e))),
            SqlValue::Bytes(b) => serde_json::from_slice(b)
                .map_err(|e| Error::decode(format!("invalid json: {}", e))),
            other => Ok(other.to_json()),
        }
    }
}

impl SqlArrayElement for JsonValue {}
