// Code generated by rustf-querygen. DO NOT EDIT.
// versions:
//   rustf-querygen v0.1.0

use rustf_querygen::runtime as rt;
#[allow(unused_imports)]
use rustf_querygen::runtime::{FromRow as _, FromSql as _, ToSql as _};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mood {
    Happy,
    Sad,
}

impl Mood {
    /// SQL type this enum maps
    pub const SQL_TYPE: &'static str = "mood";

    pub const ALL: &'static [Mood] = &[
        Mood::Happy,
        Mood::Sad,
    ];

    /// Value as stored in the database
    pub fn as_str(&self) -> &'static str {
        match *self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
        }
    }
}

impl ::std::fmt::Display for Mood {
    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl rt::ToSql for Mood {
    fn to_sql(&self) -> rt::SqlValue {
        rt::SqlValue::Text(self.as_str().to_string())
    }
}

impl rt::FromSql for Mood {
    fn from_sql(value: &rt::SqlValue) -> rt::Result<Self> {
        let text = <::std::string::String as rt::FromSql>::from_sql(value)?;
        match text.as_str() {
            "happy" => Ok(Mood::Happy),
            "sad" => Ok(Mood::Sad),
            other => Err(rt::Error::decode(format!("invalid Mood value '{}'", other))),
        }
    }
}

impl rt::SqlArrayElement for Mood {}

#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    pub id: i64,
    pub name: ::std::string::String,
    pub bio: ::std::option::Option<::std::string::String>,
    pub mood: ::std::option::Option<Mood>,
}

impl rt::FromRow for Author {
    fn from_row(row: &rt::Row) -> rt::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            bio: row.get(2)?,
            mood: row.get(3)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Option {
    pub id: i64,
    pub label: ::std::option::Option<::std::string::String>,
}

impl rt::FromRow for Option {
    fn from_row(row: &rt::Row) -> rt::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            label: row.get(1)?,
        })
    }
}
