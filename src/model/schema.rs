//! Schema modeling: catalog tables and enum types to structs and enums

use super::Namespace;
use crate::catalog::{Catalog, EnumType, Table};
use crate::config::Config;
use crate::naming::{field_ident, normalize, singularize};
use crate::types::{SqlTypeName, TargetType, TypeMapper};
use crate::{Diagnostics, GenerateError, Result};
use serde::Serialize;
use std::collections::BTreeSet;

/// A struct field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// Normalized exported name (`UserID`)
    pub name: String,
    /// Rust field identifier (`user_id`)
    pub ident: String,
    /// Raw column or parameter name
    pub column: String,
    pub ty: TargetType,
    pub comment: Option<String>,
}

/// What a struct was derived from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructSource {
    Table { table: String },
    QueryParams { query: String },
    QueryRow { query: String },
}

/// Entity, parameter or result struct
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Struct {
    pub name: String,
    pub source: StructSource,
    /// Always in column order; generated row decoding is positional
    pub fields: Vec<Field>,
    pub comment: Option<String>,
}

impl Struct {
    /// Qualified name of the source table, for table structs
    pub fn table(&self) -> Option<&str> {
        match &self.source {
            StructSource::Table { table } => Some(table),
            _ => None,
        }
    }

    /// Structs are the same entity only when derived from the same table
    pub fn is_same_entity(&self, other: &Struct) -> bool {
        match (self.table(), other.table()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Same field names and types in the same order
    pub fn matches_shape(&self, fields: &[Field]) -> bool {
        self.fields.len() == fields.len()
            && self
                .fields
                .iter()
                .zip(fields)
                .all(|(a, b)| a.name == b.name && a.ty.rust_type() == b.ty.rust_type())
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether generated code decodes this struct from rows
    pub fn is_row(&self) -> bool {
        !matches!(self.source, StructSource::QueryParams { .. })
    }
}

/// One enum value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumValue {
    /// Value as stored in the database
    pub raw: String,
    /// Normalized constant name
    pub name: String,
}

/// Enumeration modeled from a catalog enum type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enum {
    pub name: String,
    /// Qualified SQL type name
    pub sql_name: String,
    pub values: Vec<EnumValue>,
    pub comment: Option<String>,
}

/// Column-like input for field modeling
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldInput<'a> {
    pub name: &'a str,
    pub sql_type: &'a str,
    pub nullable: bool,
    pub is_array: bool,
    pub enum_ref: Option<&'a str>,
    pub comment: Option<&'a str>,
}

/// Structs and enums modeled from the catalog
#[derive(Debug, Clone)]
pub struct SchemaModel {
    pub structs: Vec<Struct>,
    pub enums: Vec<Enum>,
    names: Namespace,
}

impl SchemaModel {
    /// Build the model, failing with every collected error
    pub fn build(catalog: &Catalog, config: &Config) -> Result<Self> {
        let mut diagnostics = Diagnostics::new();
        let model = Self::build_collecting(catalog, config, &mut diagnostics);
        diagnostics.into_result()?;
        Ok(model)
    }

    /// Build what can be built, recording failures in `diagnostics`
    pub(crate) fn build_collecting(
        catalog: &Catalog,
        config: &Config,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let mut model = SchemaModel {
            structs: Vec::with_capacity(catalog.tables.len()),
            enums: Vec::with_capacity(catalog.enums.len()),
            names: Namespace::new(),
        };

        for enum_type in &catalog.enums {
            if let Some(modeled) = diagnostics.capture(model.build_enum(enum_type, catalog, config)) {
                log::debug!(
                    "Modeled enum '{}' as {} with {} value(s)",
                    enum_type.qualified_name(),
                    modeled.name,
                    modeled.values.len()
                );
                model.enums.push(modeled);
            }
        }

        for table in &catalog.tables {
            if let Some(modeled) = diagnostics.capture(model.build_table(table, catalog, config)) {
                log::debug!(
                    "Modeled table '{}' as {} with {} field(s)",
                    table.qualified_name(),
                    modeled.name,
                    modeled.fields.len()
                );
                model.structs.push(modeled);
            }
        }

        model
    }

    fn build_enum(&mut self, enum_type: &EnumType, catalog: &Catalog, config: &Config) -> Result<Enum> {
        let qualified = enum_type.qualified_name();
        let renamed = config
            .rename
            .get(&qualified)
            .or_else(|| config.rename.get(&enum_type.name));
        let name = match renamed {
            Some(renamed) => renamed.clone(),
            None => {
                let raw = if catalog.is_default_schema(enum_type.schema.as_deref(), config) {
                    enum_type.name.clone()
                } else {
                    format!("{}_{}", enum_type.schema.as_deref().unwrap_or_default(), enum_type.name)
                };
                normalize(&raw, config)
            }
        };

        let mut values = Vec::with_capacity(enum_type.values.len());
        let mut constants = Namespace::new();
        for raw in &enum_type.values {
            let constant = normalize(raw, config);
            constants.claim(
                &constant,
                format!("value \"{}\" of enum \"{}\"", raw, qualified),
            )?;
            values.push(EnumValue {
                raw: raw.clone(),
                name: constant,
            });
        }

        self.names.claim(&name, format!("enum \"{}\"", qualified))?;

        Ok(Enum {
            name,
            sql_name: qualified,
            values,
            comment: enum_type.comment.clone(),
        })
    }

    fn build_table(&mut self, table: &Table, catalog: &Catalog, config: &Config) -> Result<Struct> {
        let qualified = table.qualified_name();
        let name = table_struct_name(table, catalog, config);

        let inputs: Vec<FieldInput<'_>> = table
            .columns
            .iter()
            .map(|column| FieldInput {
                name: &column.name,
                sql_type: &column.sql_type,
                nullable: column.nullable,
                is_array: column.is_array,
                enum_ref: column.enum_ref.as_deref(),
                comment: column.comment.as_deref(),
            })
            .collect();

        let owner = format!("table \"{}\"", qualified);
        let fields = self.model_fields(&owner, "column", &inputs, config)?;

        self.names.claim(&name, format!("table \"{}\"", qualified))?;

        Ok(Struct {
            name,
            source: StructSource::Table { table: qualified },
            fields,
            comment: table.comment.clone(),
        })
    }

    /// Model an ordered list of columns into fields
    ///
    /// Type errors for every column are collected before failing. Duplicate
    /// names inside the list get positional suffixes.
    pub(crate) fn model_fields(
        &self,
        owner: &str,
        what: &str,
        inputs: &[FieldInput<'_>],
        config: &Config,
    ) -> Result<Vec<Field>> {
        let mapper = TypeMapper::new(config);
        let mut diagnostics = Diagnostics::new();
        let mut fields = Vec::with_capacity(inputs.len());

        for (position, input) in inputs.iter().enumerate() {
            let context = format!("{} \"{}\" of {}", what, input.name, owner);
            let mapped = self
                .resolve_enum(input.enum_ref, input.sql_type, &context)
                .and_then(|enum_ref| {
                    mapper.map(&context, input.sql_type, input.nullable, input.is_array, enum_ref)
                });

            let Some(ty) = diagnostics.capture(mapped) else {
                continue;
            };

            let fallback = format!("{}_{}", what, position + 1);
            let raw = if input.name.trim().is_empty() {
                fallback.as_str()
            } else {
                input.name
            };

            // A renamed field takes its ident from the new name
            let ident = config
                .rename
                .get(raw)
                .and_then(|renamed| field_ident(renamed))
                .or_else(|| field_ident(raw))
                .unwrap_or_else(|| fallback.clone());

            fields.push(Field {
                name: normalize(raw, config),
                ident,
                column: input.name.to_string(),
                ty,
                comment: input.comment.map(str::to_string),
            });
        }

        diagnostics.into_result()?;
        dedupe_fields(&mut fields);
        Ok(fields)
    }

    /// Resolve an explicit enum reference or a type naming a catalog enum
    pub(crate) fn resolve_enum(
        &self,
        enum_ref: Option<&str>,
        sql_type: &str,
        context: &str,
    ) -> Result<Option<&Enum>> {
        match enum_ref {
            Some(reference) => self.find_enum(reference).map(Some).ok_or_else(|| {
                GenerateError::UnmappedEnum {
                    context: context.to_string(),
                    reference: reference.to_string(),
                }
            }),
            None => Ok(self.find_enum(&SqlTypeName::parse(sql_type).name)),
        }
    }

    /// Find an enum by SQL name, qualified or not
    pub fn find_enum(&self, reference: &str) -> Option<&Enum> {
        let reference = reference.trim().trim_end_matches("[]");
        let unqualified = reference.rsplit('.').next().unwrap_or(reference);

        self.enums
            .iter()
            .find(|e| e.sql_name.eq_ignore_ascii_case(reference))
            .or_else(|| {
                self.enums.iter().find(|e| {
                    let name = e.sql_name.rsplit('.').next().unwrap_or(&e.sql_name);
                    name.eq_ignore_ascii_case(unqualified)
                })
            })
    }

    /// Table struct whose fields match exactly, in order
    pub fn table_struct_matching(&self, fields: &[Field]) -> Option<&Struct> {
        self.structs
            .iter()
            .filter(|s| s.table().is_some())
            .find(|s| s.matches_shape(fields))
    }

    pub fn get_struct(&self, name: &str) -> Option<&Struct> {
        self.structs.iter().find(|s| s.name == name)
    }

    /// Names taken by schema structs and enums
    pub fn names(&self) -> &Namespace {
        &self.names
    }
}

fn table_struct_name(table: &Table, catalog: &Catalog, config: &Config) -> String {
    let qualified = table.qualified_name();
    if let Some(renamed) = config
        .rename
        .get(&qualified)
        .or_else(|| config.rename.get(&table.name))
    {
        return renamed.clone();
    }

    let base = if config.emit_exact_table_names {
        table.name.clone()
    } else {
        singularize(&table.name)
    };

    let raw = if catalog.is_default_schema(table.schema.as_deref(), config) {
        base
    } else {
        format!("{}_{}", table.schema.as_deref().unwrap_or_default(), base)
    };

    normalize(&raw, config)
}

fn dedupe_fields(fields: &mut [Field]) {
    // Seeded with every original name so a suffix never lands on a later column
    let mut taken_names: BTreeSet<String> = fields.iter().map(|f| f.name.clone()).collect();
    let mut taken_idents: BTreeSet<String> = fields.iter().map(|f| f.ident.clone()).collect();
    let mut used_names: BTreeSet<String> = BTreeSet::new();
    let mut used_idents: BTreeSet<String> = BTreeSet::new();

    for field in fields.iter_mut() {
        let name_clash = used_names.contains(&field.name);
        let ident_clash = used_idents.contains(&field.ident);

        if name_clash || ident_clash {
            let base_ident = field.ident.trim_start_matches("r#").to_string();
            let mut n = 2;
            loop {
                let name = format!("{}{}", field.name, n);
                let ident = format!("{}_{}", base_ident, n);
                if (!name_clash || !taken_names.contains(&name))
                    && (!ident_clash || !taken_idents.contains(&ident))
                {
                    if name_clash {
                        taken_names.insert(name.clone());
                        field.name = name;
                    }
                    if ident_clash {
                        taken_idents.insert(ident.clone());
                        field.ident = ident;
                    }
                    break;
                }
                n += 1;
            }
        }

        used_names.insert(field.name.clone());
        used_idents.insert(field.ident.clone());
    }
}
