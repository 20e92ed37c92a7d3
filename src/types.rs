//! SQL type to Rust type mapping
//!
//! Resolution order: configured overrides, then enum references, then the
//! built-in table. Anything left over is an error, never a silent fallback.

use crate::config::{Config, Engine};
use crate::model::Enum;
use crate::{GenerateError, Result};
use serde::Serialize;
use std::fmt;

/// Closed set of SQL types with a built-in Rust mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlType {
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    UnsignedTinyInt,
    UnsignedSmallInt,
    UnsignedInteger,
    UnsignedBigInt,
    Real,
    Double,
    Numeric,
    Boolean,
    Text,
    Bytes,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Uuid,
    Json,
}

// Vocabulary shared by every engine
const BUILTIN_TYPES: &[(&str, SqlType)] = &[
    ("tinyint", SqlType::TinyInt),
    ("int1", SqlType::TinyInt),
    ("smallint", SqlType::SmallInt),
    ("int2", SqlType::SmallInt),
    ("smallserial", SqlType::SmallInt),
    ("serial2", SqlType::SmallInt),
    ("year", SqlType::SmallInt),
    ("integer", SqlType::Integer),
    ("int", SqlType::Integer),
    ("int4", SqlType::Integer),
    ("mediumint", SqlType::Integer),
    ("serial", SqlType::Integer),
    ("serial4", SqlType::Integer),
    ("bigint", SqlType::BigInt),
    ("int8", SqlType::BigInt),
    ("bigserial", SqlType::BigInt),
    ("serial8", SqlType::BigInt),
    ("real", SqlType::Real),
    ("float4", SqlType::Real),
    ("float", SqlType::Real),
    ("double precision", SqlType::Double),
    ("double", SqlType::Double),
    ("float8", SqlType::Double),
    ("numeric", SqlType::Numeric),
    ("decimal", SqlType::Numeric),
    ("money", SqlType::Numeric),
    ("boolean", SqlType::Boolean),
    ("bool", SqlType::Boolean),
    ("text", SqlType::Text),
    ("varchar", SqlType::Text),
    ("character varying", SqlType::Text),
    ("char", SqlType::Text),
    ("character", SqlType::Text),
    ("bpchar", SqlType::Text),
    ("nchar", SqlType::Text),
    ("nvarchar", SqlType::Text),
    ("citext", SqlType::Text),
    ("name", SqlType::Text),
    ("string", SqlType::Text),
    ("clob", SqlType::Text),
    ("tinytext", SqlType::Text),
    ("mediumtext", SqlType::Text),
    ("longtext", SqlType::Text),
    ("bytea", SqlType::Bytes),
    ("blob", SqlType::Bytes),
    ("tinyblob", SqlType::Bytes),
    ("mediumblob", SqlType::Bytes),
    ("longblob", SqlType::Bytes),
    ("binary", SqlType::Bytes),
    ("varbinary", SqlType::Bytes),
    ("date", SqlType::Date),
    ("time", SqlType::Time),
    ("time without time zone", SqlType::Time),
    ("timestamp", SqlType::Timestamp),
    ("timestamp without time zone", SqlType::Timestamp),
    ("datetime", SqlType::Timestamp),
    ("timestamptz", SqlType::TimestampTz),
    ("timestamp with time zone", SqlType::TimestampTz),
    ("uuid", SqlType::Uuid),
    ("json", SqlType::Json),
    ("jsonb", SqlType::Json),
];

// SQLite stores every INTEGER as 64 bits
const SQLITE_TYPES: &[(&str, SqlType)] = &[
    ("integer", SqlType::BigInt),
    ("int", SqlType::BigInt),
];

const MYSQL_TYPES: &[(&str, SqlType)] = &[("timestamp", SqlType::TimestampTz)];

impl SqlType {
    /// Look up a normalized type name, engine vocabulary first
    pub fn lookup(name: &str, engine: Engine) -> Option<SqlType> {
        let overlay: &[(&str, SqlType)] = match engine {
            Engine::Sqlite => SQLITE_TYPES,
            Engine::Mysql => MYSQL_TYPES,
            Engine::Postgresql => &[],
        };

        overlay
            .iter()
            .chain(BUILTIN_TYPES.iter())
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, sql_type)| *sql_type)
    }

    fn unsigned(self) -> SqlType {
        match self {
            SqlType::TinyInt => SqlType::UnsignedTinyInt,
            SqlType::SmallInt => SqlType::UnsignedSmallInt,
            SqlType::Integer => SqlType::UnsignedInteger,
            SqlType::BigInt => SqlType::UnsignedBigInt,
            other => other,
        }
    }

    /// Rust type path the generated code uses
    pub fn rust_type(&self) -> &'static str {
        match self {
            SqlType::TinyInt => "i8",
            SqlType::SmallInt => "i16",
            SqlType::Integer => "i32",
            SqlType::BigInt => "i64",
            SqlType::UnsignedTinyInt => "u8",
            SqlType::UnsignedSmallInt => "u16",
            SqlType::UnsignedInteger => "u32",
            SqlType::UnsignedBigInt => "u64",
            SqlType::Real => "f32",
            SqlType::Double => "f64",
            SqlType::Numeric => "::rust_decimal::Decimal",
            SqlType::Boolean => "bool",
            SqlType::Text => "::std::string::String",
            SqlType::Bytes => "::std::vec::Vec<u8>",
            SqlType::Date => "::chrono::NaiveDate",
            SqlType::Time => "::chrono::NaiveTime",
            SqlType::Timestamp => "::chrono::NaiveDateTime",
            SqlType::TimestampTz => "::chrono::DateTime<::chrono::Utc>",
            SqlType::Uuid => "::uuid::Uuid",
            SqlType::Json => "::serde_json::Value",
        }
    }
}

/// A declared SQL type after cleanup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlTypeName {
    /// Lower-cased, schema and size parameters stripped
    pub name: String,
    pub is_array: bool,
    pub unsigned: bool,
}

impl SqlTypeName {
    /// `pg_catalog.VARCHAR(255)[]` -> `varchar`, array
    pub fn parse(raw: &str) -> Self {
        let mut name = raw.trim().to_lowercase();
        let mut is_array = false;

        while let Some(stripped) = name.strip_suffix("[]") {
            name = stripped.trim_end().to_string();
            is_array = true;
        }

        if let Some(open) = name.find('(') {
            let close = name[open..].find(')').map(|c| open + c + 1).unwrap_or(name.len());
            name = format!("{}{}", &name[..open], &name[close..]);
        }

        let unsigned = name.split_whitespace().any(|w| w == "unsigned");
        name = name
            .split_whitespace()
            .filter(|w| *w != "unsigned" && *w != "zerofill")
            .collect::<Vec<_>>()
            .join(" ");

        if let Some(stripped) = name.strip_prefix("pg_catalog.") {
            name = stripped.to_string();
        }

        Self {
            name,
            is_array,
            unsigned,
        }
    }
}

/// Where a mapped type came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TypeSource {
    Builtin(SqlType),
    Enum(String),
    Override(String),
}

/// Rust type of a field, parameter or result column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetType {
    /// Element type without `Option`/`Vec` wrapping
    pub base: String,
    pub nullable: bool,
    pub is_array: bool,
    pub source: TypeSource,
}

impl TargetType {
    /// Full Rust type, e.g. `::std::option::Option<::std::vec::Vec<i64>>`
    ///
    /// Std wrappers are written as absolute paths so a generated struct
    /// named `Option`, `String` or `Vec` cannot shadow them.
    pub fn rust_type(&self) -> String {
        let inner = if self.is_array {
            format!("::std::vec::Vec<{}>", self.base)
        } else {
            self.base.clone()
        };

        if self.nullable {
            format!("::std::option::Option<{}>", inner)
        } else {
            inner
        }
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.source, TypeSource::Enum(_))
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rust_type())
    }
}

/// Maps SQL types to Rust types under a configuration
pub struct TypeMapper<'a> {
    config: &'a Config,
}

impl<'a> TypeMapper<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Map one column or parameter type
    ///
    /// `context` names the column or parameter for error messages.
    /// Nullability wraps in `Option`, arrays in `Vec`, for every source.
    pub fn map(
        &self,
        context: &str,
        sql_type: &str,
        nullable: bool,
        is_array: bool,
        enum_ref: Option<&Enum>,
    ) -> Result<TargetType> {
        let parsed = SqlTypeName::parse(sql_type);
        let is_array = is_array || parsed.is_array;

        if let Some(rust_type) = self.override_for(sql_type, &parsed) {
            return Ok(TargetType {
                base: rust_type.clone(),
                nullable,
                is_array,
                source: TypeSource::Override(sql_type.to_string()),
            });
        }

        if let Some(enum_type) = enum_ref {
            return Ok(TargetType {
                base: enum_type.name.clone(),
                nullable,
                is_array,
                source: TypeSource::Enum(enum_type.sql_name.clone()),
            });
        }

        let builtin = SqlType::lookup(&parsed.name, self.config.engine)
            .map(|t| if parsed.unsigned { t.unsigned() } else { t })
            .ok_or_else(|| GenerateError::UnknownType {
                context: context.to_string(),
                sql_type: sql_type.to_string(),
            })?;

        Ok(TargetType {
            base: builtin.rust_type().to_string(),
            nullable,
            is_array,
            source: TypeSource::Builtin(builtin),
        })
    }

    fn override_for(&self, raw: &str, parsed: &SqlTypeName) -> Option<&String> {
        let overrides = &self.config.type_overrides;
        overrides.get(raw).or_else(|| overrides.get(&parsed.name)).or_else(|| {
            overrides
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(raw.trim()))
                .map(|(_, value)| value)
        })
    }
}
