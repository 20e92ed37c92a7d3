//! Generation request types
//!
//! These are the already-decoded values handed over by the SQL analysis
//! front end: the catalog, the annotated queries and the configuration.

use crate::config::Config;
use crate::{GenerateError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One generation run's complete input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    #[serde(default)]
    pub catalog: Catalog,

    #[serde(default)]
    pub queries: Vec<QueryDescriptor>,

    pub config: Config,
}

impl GenerationRequest {
    pub fn new(catalog: Catalog, queries: Vec<QueryDescriptor>, config: Config) -> Self {
        Self {
            catalog,
            queries,
            config,
        }
    }

    /// Decode a request from JSON
    pub fn from_json_str(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Decode a request from YAML
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(input)?)
    }
}

/// Tables and enum types known to the analyzer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Schema that needs no prefix in generated names
    #[serde(default)]
    pub default_schema: Option<String>,

    #[serde(default)]
    pub tables: Vec<Table>,

    #[serde(default)]
    pub enums: Vec<EnumType>,
}

impl Catalog {
    /// Whether a schema qualifier should show up in generated names
    pub fn is_default_schema(&self, schema: Option<&str>, config: &Config) -> bool {
        match schema {
            None => true,
            Some(schema) if schema.is_empty() => true,
            Some(schema) => {
                let default = self
                    .default_schema
                    .as_deref()
                    .unwrap_or_else(|| config.engine.default_schema());
                schema == default
            }
        }
    }
}

/// Table definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub schema: Option<String>,

    pub name: String,

    #[serde(default)]
    pub columns: Vec<Column>,

    #[serde(default)]
    pub comment: Option<String>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            schema: None,
            name: name.into(),
            columns,
            comment: None,
        }
    }

    /// `schema.name`, or just the name
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) if !schema.is_empty() => format!("{}.{}", schema, self.name),
            _ => self.name.clone(),
        }
    }
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,

    /// Declared SQL type (`int`, `varchar(255)`, `user_status`, ...)
    #[serde(rename = "type")]
    pub sql_type: String,

    #[serde(default)]
    pub nullable: bool,

    #[serde(default)]
    pub is_array: bool,

    /// Explicit enum type this column uses
    #[serde(default)]
    pub enum_ref: Option<String>,

    #[serde(default)]
    pub comment: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            nullable: false,
            is_array: false,
            enum_ref: None,
            comment: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    pub fn with_enum(mut self, enum_ref: impl Into<String>) -> Self {
        self.enum_ref = Some(enum_ref.into());
        self
    }
}

/// Named enum type with ordered values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumType {
    #[serde(default)]
    pub schema: Option<String>,

    pub name: String,

    #[serde(default)]
    pub values: Vec<String>,

    #[serde(default)]
    pub comment: Option<String>,
}

impl EnumType {
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            schema: None,
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
            comment: None,
        }
    }

    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) if !schema.is_empty() => format!("{}.{}", schema, self.name),
            _ => self.name.clone(),
        }
    }
}

/// Execution shape of a query, fixed by its annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QueryKind {
    #[serde(rename = "single-row", alias = ":one", alias = "one")]
    One,
    #[serde(rename = "multi-row", alias = ":many", alias = "many")]
    Many,
    #[serde(rename = "exec-no-result", alias = ":exec", alias = "exec")]
    Exec,
    #[serde(rename = "exec-rows-affected", alias = ":execrows", alias = "execrows")]
    ExecRows,
    #[serde(rename = "exec-raw-result", alias = ":execresult", alias = "execresult")]
    ExecResult,
    #[serde(rename = "exec-last-inserted-id", alias = ":execlastid", alias = "execlastid")]
    ExecLastId,
    #[serde(rename = "batch-exec", alias = ":batchexec", alias = "batchexec")]
    BatchExec,
    #[serde(rename = "batch-single-row", alias = ":batchone", alias = "batchone")]
    BatchOne,
    #[serde(rename = "batch-multi-row", alias = ":batchmany", alias = "batchmany")]
    BatchMany,
    #[serde(rename = "bulk-copy", alias = ":copyfrom", alias = "copyfrom")]
    CopyFrom,
}

impl QueryKind {
    pub const ALL: [QueryKind; 10] = [
        QueryKind::One,
        QueryKind::Many,
        QueryKind::Exec,
        QueryKind::ExecRows,
        QueryKind::ExecResult,
        QueryKind::ExecLastId,
        QueryKind::BatchExec,
        QueryKind::BatchOne,
        QueryKind::BatchMany,
        QueryKind::CopyFrom,
    ];

    /// The SQL comment annotation for this kind (`:one`, `:copyfrom`, ...)
    pub fn annotation(&self) -> &'static str {
        match self {
            QueryKind::One => ":one",
            QueryKind::Many => ":many",
            QueryKind::Exec => ":exec",
            QueryKind::ExecRows => ":execrows",
            QueryKind::ExecResult => ":execresult",
            QueryKind::ExecLastId => ":execlastid",
            QueryKind::BatchExec => ":batchexec",
            QueryKind::BatchOne => ":batchone",
            QueryKind::BatchMany => ":batchmany",
            QueryKind::CopyFrom => ":copyfrom",
        }
    }

    /// Parse a `-- name: GetUser :one` style annotation
    pub fn from_annotation(annotation: &str) -> Result<Self> {
        let trimmed = annotation.trim();
        let wanted = if trimmed.starts_with(':') {
            trimmed.to_string()
        } else {
            format!(":{}", trimmed)
        };

        Self::ALL
            .into_iter()
            .find(|kind| kind.annotation().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| {
                GenerateError::Config(format!("unknown query annotation '{}'", annotation))
            })
    }

    /// Kinds whose generated code decodes rows
    pub fn returns_rows(&self) -> bool {
        matches!(
            self,
            QueryKind::One | QueryKind::Many | QueryKind::BatchOne | QueryKind::BatchMany
        )
    }

    pub fn is_batch(&self) -> bool {
        matches!(
            self,
            QueryKind::BatchExec | QueryKind::BatchOne | QueryKind::BatchMany
        )
    }

    /// Kinds whose generated code runs the SQL text as written
    ///
    /// `:copyfrom` loads through the table and column list instead.
    pub fn has_sql_const(&self) -> bool {
        !matches!(self, QueryKind::CopyFrom)
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.annotation())
    }
}

/// Query parameter as inferred by the analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type")]
    pub sql_type: String,

    #[serde(default)]
    pub nullable: bool,

    #[serde(default)]
    pub is_array: bool,

    /// Placeholder number (`$2` -> 2); defaults to the 1-based position
    #[serde(default)]
    pub number: Option<u32>,

    #[serde(default)]
    pub enum_ref: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            nullable: false,
            is_array: false,
            number: None,
            enum_ref: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn numbered(mut self, number: u32) -> Self {
        self.number = Some(number);
        self
    }
}

/// Result column as inferred by the analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultColumn {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type")]
    pub sql_type: String,

    #[serde(default)]
    pub nullable: bool,

    #[serde(default)]
    pub is_array: bool,

    #[serde(default)]
    pub enum_ref: Option<String>,
}

impl ResultColumn {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            nullable: false,
            is_array: false,
            enum_ref: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

impl From<&Column> for ResultColumn {
    fn from(column: &Column) -> Self {
        Self {
            name: column.name.clone(),
            sql_type: column.sql_type.clone(),
            nullable: column.nullable,
            is_array: column.is_array,
            enum_ref: column.enum_ref.clone(),
        }
    }
}

/// One annotated SQL statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    pub name: String,

    pub kind: QueryKind,

    #[serde(default)]
    pub parameters: Vec<Parameter>,

    #[serde(default)]
    pub result_columns: Vec<ResultColumn>,

    #[serde(rename = "sql", alias = "sql_text")]
    pub sql: String,

    /// Source file the query came from; queries are grouped by it
    #[serde(default)]
    pub filename: Option<String>,

    /// Target table of an `INSERT`, required for bulk copy
    #[serde(default)]
    pub insert_into_table: Option<String>,

    #[serde(default)]
    pub comments: Vec<String>,
}

impl QueryDescriptor {
    pub fn new(name: impl Into<String>, kind: QueryKind, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            parameters: Vec::new(),
            result_columns: Vec::new(),
            sql: sql.into(),
            filename: None,
            insert_into_table: None,
            comments: Vec::new(),
        }
    }

    pub fn with_params(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_columns(mut self, columns: Vec<ResultColumn>) -> Self {
        self.result_columns = columns;
        self
    }

    pub fn into_table(mut self, table: impl Into<String>) -> Self {
        self.insert_into_table = Some(table.into());
        self
    }

    pub fn in_file(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}
