//! Generation options
//!
//! A `Config` is built once per request and handed by reference to every
//! component that needs it. Nothing here is global.

use crate::naming::is_rust_keyword;
use crate::{GenerateError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Database engine the generated code targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    #[serde(alias = "postgres")]
    Postgresql,
    #[serde(alias = "mariadb")]
    Mysql,
    Sqlite,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Postgresql => "postgresql",
            Engine::Mysql => "mysql",
            Engine::Sqlite => "sqlite",
        }
    }

    /// What the engine can do without help from the caller
    pub fn default_capabilities(&self) -> Capabilities {
        match self {
            // RETURNING is the way to get keys back, there is no last-insert-id
            Engine::Postgresql => Capabilities {
                last_insert_id: false,
                copy_from: true,
            },
            Engine::Mysql => Capabilities {
                last_insert_id: true,
                copy_from: true,
            },
            Engine::Sqlite => Capabilities {
                last_insert_id: true,
                copy_from: false,
            },
        }
    }

    /// Schema tables live in when none is given
    pub fn default_schema(&self) -> &'static str {
        match self {
            Engine::Postgresql => "public",
            Engine::Mysql => "",
            Engine::Sqlite => "main",
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::Postgresql
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved backend capability flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    /// Single-statement retrieval of a generated identity (`:execlastid`)
    pub last_insert_id: bool,
    /// Bulk loading path (`:copyfrom`)
    pub copy_from: bool,
}

/// Per-flag overrides of the engine defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityOverrides {
    #[serde(default)]
    pub last_insert_id: Option<bool>,
    #[serde(default)]
    pub copy_from: Option<bool>,
}

/// Generation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Namespace of the generated module (required)
    #[serde(default)]
    pub package_name: String,

    #[serde(default)]
    pub engine: Engine,

    /// Raw identifier to final name, bypassing normalization
    #[serde(default)]
    pub rename: BTreeMap<String, String>,

    /// Segments kept fully upper-case, matched case-insensitively
    #[serde(default = "default_initialisms")]
    pub initialisms: BTreeSet<String>,

    /// SQL type name to Rust type path, checked before anything else
    #[serde(default)]
    pub type_overrides: BTreeMap<String, String>,

    /// Queries with more parameters than this get a params struct
    #[serde(default = "default_query_parameter_limit")]
    pub query_parameter_limit: usize,

    /// Use table names as-is instead of singularizing them
    #[serde(default)]
    pub emit_exact_table_names: bool,

    #[serde(default)]
    pub capabilities: CapabilityOverrides,
}

fn default_initialisms() -> BTreeSet<String> {
    ["id".to_string()].into_iter().collect()
}

fn default_query_parameter_limit() -> usize {
    1
}

impl Config {
    /// Create a configuration with defaults for everything but the package
    pub fn new(package_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            engine: Engine::default(),
            rename: BTreeMap::new(),
            initialisms: default_initialisms(),
            type_overrides: BTreeMap::new(),
            query_parameter_limit: default_query_parameter_limit(),
            emit_exact_table_names: false,
            capabilities: CapabilityOverrides::default(),
        }
    }

    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_initialisms<I, S>(mut self, initialisms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.initialisms = initialisms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_rename(mut self, raw: impl Into<String>, name: impl Into<String>) -> Self {
        self.rename.insert(raw.into(), name.into());
        self
    }

    pub fn with_type_override(
        mut self,
        sql_type: impl Into<String>,
        rust_type: impl Into<String>,
    ) -> Self {
        self.type_overrides.insert(sql_type.into(), rust_type.into());
        self
    }

    pub fn with_query_parameter_limit(mut self, limit: usize) -> Self {
        self.query_parameter_limit = limit;
        self
    }

    /// Parse configuration from YAML
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(input)?)
    }

    /// Check whether a name segment is a configured initialism
    pub fn is_initialism(&self, segment: &str) -> bool {
        self.initialisms
            .iter()
            .any(|initialism| initialism.eq_ignore_ascii_case(segment))
    }

    /// Engine defaults with the configured overrides applied
    pub fn capabilities(&self) -> Capabilities {
        let defaults = self.engine.default_capabilities();
        Capabilities {
            last_insert_id: self
                .capabilities
                .last_insert_id
                .unwrap_or(defaults.last_insert_id),
            copy_from: self.capabilities.copy_from.unwrap_or(defaults.copy_from),
        }
    }

    /// Validate the configuration before any modeling starts
    pub fn validate(&self) -> Result<()> {
        if self.package_name.trim().is_empty() {
            return Err(GenerateError::Config(
                "package_name is required".to_string(),
            ));
        }

        if !is_module_name(&self.package_name) {
            return Err(GenerateError::Config(format!(
                "package_name '{}' is not a valid module name",
                self.package_name
            )));
        }

        for (raw, name) in &self.rename {
            if name.trim().is_empty() {
                return Err(GenerateError::Config(format!(
                    "rename for '{}' must not be empty",
                    raw
                )));
            }
        }

        for (sql_type, rust_type) in &self.type_overrides {
            if rust_type.trim().is_empty() {
                return Err(GenerateError::Config(format!(
                    "type override for '{}' must name a type",
                    sql_type
                )));
            }
        }

        if let Some(bad) = self
            .initialisms
            .iter()
            .find(|i| i.is_empty() || !i.chars().all(char::is_alphanumeric))
        {
            return Err(GenerateError::Config(format!(
                "initialism '{}' must be a non-empty run of letters or digits",
                bad
            )));
        }

        Ok(())
    }
}

fn is_module_name(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);

    starts_well
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name != "_"
        && !is_rust_keyword(name)
}
