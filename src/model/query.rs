//! Query classification
//!
//! Each annotated statement becomes a `Query`: a method name, a parameter
//! shape, a result shape and the ordered argument bindings. Any params or row
//! structs a query needs are synthesized here and claimed in the shared
//! namespace, so a clash with a table struct is reported, not papered over.

use super::schema::{Field, FieldInput, SchemaModel, Struct, StructSource};
use super::Namespace;
use crate::catalog::{QueryDescriptor, QueryKind};
use crate::config::Config;
use crate::naming::{const_name, query_name};
use crate::types::TargetType;
use crate::{GenerateError, Result};
use serde::Serialize;

/// How a query takes its parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamShape {
    None,
    /// Positional arguments, in parameter order
    Inline { fields: Vec<Field> },
    /// One synthesized params struct
    Struct { name: String, fields: Vec<Field> },
}

impl ParamShape {
    pub fn fields(&self) -> &[Field] {
        match self {
            ParamShape::None => &[],
            ParamShape::Inline { fields } | ParamShape::Struct { fields, .. } => fields,
        }
    }

    pub fn struct_name(&self) -> Option<&str> {
        match self {
            ParamShape::Struct { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// What a query hands back to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultShape {
    Void,
    RowsAffected,
    LastInsertId,
    RawResult,
    Count,
    Scalar { ty: TargetType },
    /// A row struct; `reused` when it is an existing table struct
    Struct { name: String, reused: bool },
}

/// One bound placeholder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgBinding {
    pub placeholder: u32,
    /// Identifier of the argument or params struct field
    pub field: String,
    /// Position in the parameter list
    pub param_index: usize,
}

/// A fully classified query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    /// Normalized query name (`GetUserByID`)
    pub method_name: String,
    /// Wrapper type name (`GetUserByIDQuery`)
    pub type_name: String,
    /// Name of the SQL text constant (`GET_USER_BY_ID`)
    pub const_name: String,
    pub kind: QueryKind,
    pub params: ParamShape,
    pub result: ResultShape,
    pub sql: String,
    /// Sorted by placeholder, one entry per placeholder
    pub arg_bindings: Vec<ArgBinding>,
    pub insert_into_table: Option<String>,
    /// Target columns of a bulk copy, in parameter order
    pub copy_columns: Vec<String>,
    pub filename: Option<String>,
    pub comments: Vec<String>,
}

/// A query plus the structs synthesized for it
#[derive(Debug, Clone)]
pub struct BuiltQuery {
    pub query: Query,
    pub structs: Vec<Struct>,
}

/// Builds queries against a finished schema model
pub struct QueryBuilder<'a> {
    config: &'a Config,
    schema: &'a SchemaModel,
    names: Namespace,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(config: &'a Config, schema: &'a SchemaModel) -> Self {
        Self {
            config,
            schema,
            names: schema.names().clone(),
        }
    }

    /// Classify one descriptor
    ///
    /// Names are only claimed once the query is known to be valid, so a
    /// rejected query never blocks the names of a later one.
    pub fn build(&mut self, descriptor: &QueryDescriptor) -> Result<BuiltQuery> {
        self.check_capability(descriptor)?;
        self.check_shape(descriptor)?;

        let method_name = query_name(&descriptor.name, self.config);
        let owner = format!("query \"{}\"", descriptor.name);

        let params = self.param_fields(descriptor, &owner);
        let results = if descriptor.kind.returns_rows() {
            self.result_fields(descriptor, &owner)
        } else {
            Ok(Vec::new())
        };
        let (param_fields, result_fields) = match (params, results) {
            (Ok(params), Ok(results)) => (params, results),
            (Err(error), Ok(_)) | (Ok(_), Err(error)) => return Err(error),
            (Err(first), Err(second)) => return Err(GenerateError::Aggregate(vec![first, second])),
        };

        let type_name = format!("{}Query", method_name);
        self.names.claim(&type_name, owner.clone())?;

        let const_name = const_name(&method_name);
        if descriptor.kind.has_sql_const() {
            self.names.claim(&const_name, format!("SQL constant of {}", owner))?;
        }

        let mut structs = Vec::new();
        let arg_bindings = bind_arguments(descriptor, &param_fields);
        let copy_columns = match descriptor.kind {
            QueryKind::CopyFrom => descriptor.parameters.iter().map(|p| p.name.clone()).collect(),
            _ => Vec::new(),
        };

        let params = if param_fields.is_empty() {
            ParamShape::None
        } else if descriptor.kind == QueryKind::CopyFrom
            || param_fields.len() > self.config.query_parameter_limit
        {
            let name = format!("{}Params", method_name);
            self.names.claim(&name, format!("params of {}", owner))?;
            structs.push(Struct {
                name: name.clone(),
                source: StructSource::QueryParams {
                    query: descriptor.name.clone(),
                },
                fields: param_fields.clone(),
                comment: None,
            });
            ParamShape::Struct {
                name,
                fields: param_fields,
            }
        } else {
            ParamShape::Inline {
                fields: param_fields,
            }
        };

        let result = match descriptor.kind {
            QueryKind::Exec | QueryKind::BatchExec => ResultShape::Void,
            QueryKind::ExecRows => ResultShape::RowsAffected,
            QueryKind::ExecResult => ResultShape::RawResult,
            QueryKind::ExecLastId => ResultShape::LastInsertId,
            QueryKind::CopyFrom => ResultShape::Count,
            QueryKind::One | QueryKind::Many | QueryKind::BatchOne | QueryKind::BatchMany => {
                self.row_result(descriptor, &method_name, &owner, result_fields, &mut structs)?
            }
        };

        Ok(BuiltQuery {
            query: Query {
                const_name,
                method_name,
                type_name,
                kind: descriptor.kind,
                params,
                result,
                sql: descriptor.sql.clone(),
                arg_bindings,
                insert_into_table: descriptor.insert_into_table.clone(),
                copy_columns,
                filename: descriptor.filename.clone(),
                comments: descriptor.comments.clone(),
            },
            structs,
        })
    }

    fn check_capability(&self, descriptor: &QueryDescriptor) -> Result<()> {
        let capabilities = self.config.capabilities();
        let supported = match descriptor.kind {
            QueryKind::ExecLastId => capabilities.last_insert_id,
            QueryKind::CopyFrom => capabilities.copy_from,
            _ => true,
        };

        if supported {
            Ok(())
        } else {
            Err(GenerateError::UnsupportedKind {
                query: descriptor.name.clone(),
                kind: descriptor.kind.to_string(),
                engine: self.config.engine.to_string(),
            })
        }
    }

    fn check_shape(&self, descriptor: &QueryDescriptor) -> Result<()> {
        let invalid = |reason: &str| {
            Err(GenerateError::InvalidQuery {
                query: descriptor.name.clone(),
                reason: reason.to_string(),
            })
        };

        if descriptor.name.trim().is_empty() {
            return invalid("query name is empty");
        }
        if descriptor.kind.returns_rows() && descriptor.result_columns.is_empty() {
            return invalid(&format!(
                "{} returns rows but no result columns were inferred",
                descriptor.kind
            ));
        }
        if descriptor.kind.is_batch() && descriptor.parameters.is_empty() {
            return invalid(&format!(
                "{} needs at least one parameter per item",
                descriptor.kind
            ));
        }
        if descriptor.kind == QueryKind::CopyFrom {
            if descriptor.insert_into_table.is_none() {
                return invalid(":copyfrom requires an INSERT target table");
            }
            if descriptor.parameters.is_empty() {
                return invalid(":copyfrom requires at least one column parameter");
            }
        }

        Ok(())
    }

    fn param_fields(&self, descriptor: &QueryDescriptor, owner: &str) -> Result<Vec<Field>> {
        let inputs: Vec<FieldInput<'_>> = descriptor
            .parameters
            .iter()
            .map(|param| FieldInput {
                name: &param.name,
                sql_type: &param.sql_type,
                nullable: param.nullable,
                is_array: param.is_array,
                enum_ref: param.enum_ref.as_deref(),
                comment: None,
            })
            .collect();

        self.schema.model_fields(owner, "param", &inputs, self.config)
    }

    fn result_fields(&self, descriptor: &QueryDescriptor, owner: &str) -> Result<Vec<Field>> {
        let inputs: Vec<FieldInput<'_>> = descriptor
            .result_columns
            .iter()
            .map(|column| FieldInput {
                name: &column.name,
                sql_type: &column.sql_type,
                nullable: column.nullable,
                is_array: column.is_array,
                enum_ref: column.enum_ref.as_deref(),
                comment: None,
            })
            .collect();

        self.schema.model_fields(owner, "column", &inputs, self.config)
    }

    fn row_result(
        &mut self,
        descriptor: &QueryDescriptor,
        method_name: &str,
        owner: &str,
        fields: Vec<Field>,
        structs: &mut Vec<Struct>,
    ) -> Result<ResultShape> {
        if fields.len() == 1 {
            return Ok(ResultShape::Scalar {
                ty: fields[0].ty.clone(),
            });
        }

        if let Some(existing) = self.schema.table_struct_matching(&fields) {
            return Ok(ResultShape::Struct {
                name: existing.name.clone(),
                reused: true,
            });
        }

        let name = format!("{}Row", method_name);
        self.names.claim(&name, format!("row of {}", owner))?;
        structs.push(Struct {
            name: name.clone(),
            source: StructSource::QueryRow {
                query: descriptor.name.clone(),
            },
            fields,
            comment: None,
        });

        Ok(ResultShape::Struct {
            name,
            reused: false,
        })
    }
}

fn bind_arguments(descriptor: &QueryDescriptor, fields: &[Field]) -> Vec<ArgBinding> {
    let mut bindings: Vec<ArgBinding> = descriptor
        .parameters
        .iter()
        .zip(fields)
        .enumerate()
        .map(|(index, (param, field))| ArgBinding {
            placeholder: param.number.unwrap_or(index as u32 + 1),
            field: field.ident.clone(),
            param_index: index,
        })
        .collect();

    // Stable sort keeps the first parameter for a repeated placeholder
    bindings.sort_by_key(|b| b.placeholder);
    bindings.dedup_by_key(|b| b.placeholder);
    bindings
}
