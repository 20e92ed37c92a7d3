//! RustF QueryGen - Type-safe data access generated from SQL catalogs
//!
//! This crate turns a catalog of tables, columns and enum types plus a list
//! of annotated SQL statements into Rust source code: entity structs for
//! rows, parameter and result types for every query, one callable wrapper
//! per query and the executor abstraction those wrappers run against.
//!
//! # Features
//!
//! - **Deterministic naming** with initialisms, renames and digit guards
//! - **Closed SQL type table** with an explicit override layer
//! - **Collision detection** across structs, enums and query types
//! - **Ten query shapes** from `:one` to `:copyfrom`, including batches
//! - **Runtime executor** with transaction scoping, usable by generated code
//!
//! # Example
//!
//! ```rust,no_run
//! use rustf_querygen::{generate, GenerationRequest};
//!
//! # fn example(input: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let request = GenerationRequest::from_yaml_str(input)?;
//! let files = generate(&request)?;
//! for (name, source) in &files {
//!     println!("// {}\n{}", name, source);
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use thiserror::Error;

pub mod catalog;
pub mod codegen;
pub mod config;
pub mod model;
pub mod naming;
pub mod runtime;
pub mod types;

pub use catalog::{
    Catalog, Column, EnumType, GenerationRequest, Parameter, QueryDescriptor, QueryKind,
    ResultColumn, Table,
};
pub use codegen::Renderer;
pub use config::{Capabilities, Config, Engine};
pub use model::{Enum, Field, Package, Query, SchemaModel, Struct};
pub use types::{SqlType, TargetType, TypeMapper};

/// Generated output: file name to source text, ordered by file name
pub type GeneratedFiles = BTreeMap<String, String>;

/// Generation errors
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown SQL type '{sql_type}' for {context}")]
    UnknownType { context: String, sql_type: String },

    #[error("Unmapped enum reference '{reference}' for {context}")]
    UnmappedEnum { context: String, reference: String },

    #[error("Naming collision: {first} and {second} both normalize to '{name}'")]
    NamingCollision {
        name: String,
        first: String,
        second: String,
    },

    #[error("Unsupported query kind {kind} for query '{query}' on engine {engine}")]
    UnsupportedKind {
        query: String,
        kind: String,
        engine: String,
    },

    #[error("Invalid query '{query}': {reason}")]
    InvalidQuery { query: String, reason: String },

    #[error("Code generation error: {0}")]
    CodeGen(String),

    #[error("Template error: {0}")]
    Template(#[from] handlebars::RenderError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Generation failed with {} error(s):\n{}", .0.len(), join_errors(.0))]
    Aggregate(Vec<GenerateError>),
}

impl GenerateError {
    /// All individual errors, flattening aggregates
    pub fn errors(&self) -> Vec<&GenerateError> {
        match self {
            GenerateError::Aggregate(errors) => errors.iter().flat_map(|e| e.errors()).collect(),
            other => vec![other],
        }
    }
}

fn join_errors(errors: &[GenerateError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

pub type Result<T> = std::result::Result<T, GenerateError>;

/// Accumulates modeling errors so a run reports all of them at once
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<GenerateError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Record an error; aggregates are flattened
    pub fn push(&mut self, error: GenerateError) {
        match error {
            GenerateError::Aggregate(errors) => {
                for error in errors {
                    self.push(error);
                }
            }
            other => self.errors.push(other),
        }
    }

    /// Keep the value of a successful result, record the error otherwise
    pub fn capture<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.push(error);
                None
            }
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Convert to a single error if anything was recorded
    pub fn into_result(mut self) -> Result<()> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => Err(GenerateError::Aggregate(self.errors)),
        }
    }
}

/// Build the renderer-agnostic model for a request
///
/// Configuration is validated before any modeling happens. Every modeling
/// failure is collected and returned as one error; nothing is returned
/// partially.
pub fn build_package(request: &GenerationRequest) -> Result<Package> {
    request.config.validate()?;
    Package::build(&request.catalog, &request.queries, &request.config)
}

/// Run a full generation: model the request and render it to source files
pub fn generate(request: &GenerationRequest) -> Result<GeneratedFiles> {
    let package = build_package(request)?;
    log::info!(
        "Generated model for package '{}': {} struct(s), {} enum(s), {} query(ies)",
        package.name,
        package.structs.len(),
        package.enums.len(),
        package.queries.len()
    );

    let renderer = Renderer::new()?;
    renderer.render(&package)
}
