//! Renderer-agnostic model of the generated package
//!
//! Everything in here is built once per generation run and never mutated
//! afterwards. The renderer only reads it.

use crate::catalog::{Catalog, QueryDescriptor};
use crate::config::{Config, Engine};
use crate::{Diagnostics, GenerateError, Result};
use indexmap::IndexMap;
use serde::Serialize;

pub mod query;
pub mod schema;

pub use query::{ArgBinding, ParamShape, Query, QueryBuilder, ResultShape};
pub use schema::{Enum, EnumValue, Field, SchemaModel, Struct, StructSource};

/// Generated names already taken, with a description of who took them
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    claimed: IndexMap<String, String>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a name for `source`, failing if someone else already has it
    pub fn claim(&mut self, name: &str, source: impl Into<String>) -> Result<()> {
        let source = source.into();
        if let Some(first) = self.claimed.get(name) {
            return Err(GenerateError::NamingCollision {
                name: name.to_string(),
                first: first.clone(),
                second: source,
            });
        }

        self.claimed.insert(name.to_string(), source);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.claimed.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}

/// The complete model handed to the renderer
#[derive(Debug, Clone, Serialize)]
pub struct Package {
    pub name: String,
    pub engine: Engine,
    /// Table structs first in catalog order, then query structs in query order
    pub structs: Vec<Struct>,
    pub enums: Vec<Enum>,
    pub queries: Vec<Query>,
}

impl Package {
    /// Model the catalog and every query, reporting all failures at once
    pub fn build(catalog: &Catalog, queries: &[QueryDescriptor], config: &Config) -> Result<Self> {
        let mut diagnostics = Diagnostics::new();

        let schema = SchemaModel::build_collecting(catalog, config, &mut diagnostics);
        let mut builder = QueryBuilder::new(config, &schema);

        let mut query_structs = Vec::new();
        let mut built_queries = Vec::with_capacity(queries.len());
        for descriptor in queries {
            if let Some(built) = diagnostics.capture(builder.build(descriptor)) {
                log::debug!(
                    "Modeled query '{}' as {} ({})",
                    descriptor.name,
                    built.query.type_name,
                    built.query.kind
                );
                query_structs.extend(built.structs);
                built_queries.push(built.query);
            }
        }

        diagnostics.into_result()?;

        let SchemaModel { structs, enums, .. } = schema;
        let mut all_structs = structs;
        all_structs.extend(query_structs);

        Ok(Self {
            name: config.package_name.clone(),
            engine: config.engine,
            structs: all_structs,
            enums,
            queries: built_queries,
        })
    }

    pub fn get_struct(&self, name: &str) -> Option<&Struct> {
        self.structs.iter().find(|s| s.name == name)
    }

    pub fn get_enum(&self, name: &str) -> Option<&Enum> {
        self.enums.iter().find(|e| e.name == name)
    }

    pub fn get_query(&self, method_name: &str) -> Option<&Query> {
        self.queries.iter().find(|q| q.method_name == method_name)
    }
}
