//! Template views
//!
//! Everything a template prints is decided here, from the finished model.
//! Templates only lay the pieces out.

use crate::catalog::QueryKind;
use crate::model::{Enum, Field, Package, ParamShape, Query, ResultShape, Struct};
use crate::naming::{is_rust_keyword, to_snake_case};
use crate::{GenerateError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

pub const HEADER: &str = concat!(
    "// Code generated by rustf-querygen. DO NOT EDIT.\n",
    "// versions:\n",
    "//   rustf-querygen v",
    env!("CARGO_PKG_VERSION")
);

/// Module holding queries without a source file
pub const DEFAULT_QUERY_MODULE: &str = "queries";

const RESERVED_MODULES: &[&str] = &["models", "mod"];

#[derive(Debug, Clone, Serialize)]
pub struct EnumValueView {
    pub name: String,
    /// `Mood::Happy`
    pub path: String,
    /// Quoted Rust literal of the stored value
    pub literal: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnumView {
    pub name: String,
    pub sql_name: String,
    pub doc: Vec<String>,
    pub values: Vec<EnumValueView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub ident: String,
    pub rust_type: String,
    pub index: usize,
    pub doc: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StructView {
    pub name: String,
    pub doc: Vec<String>,
    pub fields: Vec<FieldView>,
    /// Whether to emit a `FromRow` impl
    pub from_row: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryView {
    pub type_name: String,
    pub const_name: String,
    /// Raw string literal of the SQL text, absent when `eval` never runs it
    pub sql_literal: Option<String>,
    pub doc: Vec<String>,
    /// Argument list of `eval`, after `&self`
    pub args: String,
    pub return_type: String,
    /// Body of `eval`, one entry per line, unindented
    pub body: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelsFile {
    pub header: &'static str,
    pub package: String,
    pub enums: Vec<EnumView>,
    pub structs: Vec<StructView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueriesFile {
    pub header: &'static str,
    pub module: String,
    pub source: Option<String>,
    pub structs: Vec<StructView>,
    pub queries: Vec<QueryView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModFile {
    pub header: &'static str,
    pub package: String,
    pub engine: String,
    pub modules: Vec<String>,
}

pub fn models_file(package: &Package) -> ModelsFile {
    ModelsFile {
        header: HEADER,
        package: package.name.clone(),
        enums: package.enums.iter().map(enum_view).collect(),
        structs: package
            .structs
            .iter()
            .filter(|s| s.table().is_some())
            .map(struct_view)
            .collect(),
    }
}

/// Query files keyed by module name
pub fn query_files(package: &Package) -> Result<BTreeMap<String, QueriesFile>> {
    let mut files: BTreeMap<String, QueriesFile> = BTreeMap::new();
    let mut sources: BTreeMap<String, String> = BTreeMap::new();

    for query in &package.queries {
        let module = module_name(query.filename.as_deref());

        if let Some(filename) = &query.filename {
            let first = sources.entry(module.clone()).or_insert_with(|| filename.clone());
            if first != filename {
                return Err(GenerateError::CodeGen(format!(
                    "query files '{}' and '{}' both map to module '{}'",
                    first, filename, module
                )));
            }
        }

        let file = files.entry(module.clone()).or_insert_with(|| QueriesFile {
            header: HEADER,
            module: module.clone(),
            source: query.filename.clone(),
            structs: Vec::new(),
            queries: Vec::new(),
        });

        for name in query_struct_names(query) {
            let found = package.get_struct(name).ok_or_else(|| {
                GenerateError::CodeGen(format!(
                    "struct '{}' used by {} is missing from the package",
                    name, query.type_name
                ))
            })?;
            file.structs.push(struct_view(found));
        }
        file.queries.push(query_view(query));
    }

    Ok(files)
}

pub fn mod_file(package: &Package, modules: Vec<String>) -> ModFile {
    ModFile {
        header: HEADER,
        package: package.name.clone(),
        engine: package.engine.to_string(),
        modules,
    }
}

/// Module name for a query source file
pub fn module_name(filename: Option<&str>) -> String {
    let stem = filename
        .and_then(|name| Path::new(name).file_stem())
        .and_then(|stem| stem.to_str())
        .map(to_snake_case)
        .unwrap_or_default();

    if stem.is_empty() {
        return DEFAULT_QUERY_MODULE.to_string();
    }

    let stem = if stem.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{}", stem)
    } else {
        stem
    };

    if RESERVED_MODULES.contains(&stem.as_str()) || is_rust_keyword(&stem) {
        format!("{}_queries", stem)
    } else {
        stem
    }
}

/// Structs a query owns, params first
fn query_struct_names(query: &Query) -> Vec<&str> {
    let mut names = Vec::new();
    if let Some(name) = query.params.struct_name() {
        names.push(name);
    }
    if let ResultShape::Struct {
        name,
        reused: false,
    } = &query.result
    {
        names.push(name.as_str());
    }
    names
}

fn doc_lines(comment: Option<&str>) -> Vec<String> {
    comment
        .map(|c| c.lines().map(|line| line.trim_end().to_string()).collect())
        .unwrap_or_default()
}

fn enum_view(e: &Enum) -> EnumView {
    EnumView {
        name: e.name.clone(),
        sql_name: e.sql_name.clone(),
        doc: doc_lines(e.comment.as_deref()),
        values: e
            .values
            .iter()
            .map(|value| EnumValueView {
                name: value.name.clone(),
                path: format!("{}::{}", e.name, value.name),
                literal: format!("{:?}", value.raw),
            })
            .collect(),
    }
}

fn field_view(index: usize, field: &Field) -> FieldView {
    FieldView {
        ident: field.ident.clone(),
        rust_type: field.ty.rust_type(),
        index,
        doc: doc_lines(field.comment.as_deref()),
    }
}

fn struct_view(s: &Struct) -> StructView {
    StructView {
        name: s.name.clone(),
        doc: doc_lines(s.comment.as_deref()),
        fields: s
            .fields
            .iter()
            .enumerate()
            .map(|(index, field)| field_view(index, field))
            .collect(),
        from_row: s.is_row(),
    }
}

/// Rust raw string literal that holds `text` verbatim
pub fn raw_string_literal(text: &str) -> String {
    let mut longest = 0;
    let mut run: Option<usize> = None;
    for ch in text.chars() {
        run = match (ch, run) {
            ('"', _) => Some(0),
            ('#', Some(n)) => Some(n + 1),
            _ => None,
        };
        if let Some(n) = run {
            longest = longest.max(n);
        }
    }

    let hashes = "#".repeat(longest + 1);
    format!("r{}\"{}\"{}", hashes, text, hashes)
}

fn query_view(query: &Query) -> QueryView {
    let mut doc: Vec<String> = query
        .comments
        .iter()
        .flat_map(|c| c.lines())
        .map(|line| line.trim_end().to_string())
        .collect();
    if !doc.is_empty() {
        doc.push(String::new());
    }
    doc.push(format!("`{}` query `{}`", query.kind, query.method_name));

    QueryView {
        type_name: query.type_name.clone(),
        const_name: query.const_name.clone(),
        sql_literal: query
            .kind
            .has_sql_const()
            .then(|| raw_string_literal(&query.sql)),
        doc,
        args: eval_args(query),
        return_type: return_type(query),
        body: eval_body(query),
    }
}

/// Type decoded from each row, if the query returns rows
fn row_type(query: &Query) -> Option<String> {
    match &query.result {
        ResultShape::Scalar { ty } => Some(ty.rust_type()),
        ResultShape::Struct { name, .. } => Some(name.clone()),
        _ => None,
    }
}

fn decoder(query: &Query) -> String {
    match &query.result {
        ResultShape::Struct { name, .. } => format!("{}::from_row", name),
        ResultShape::Scalar { ty } => format!("rt::decode_scalar::<{}>", ty.rust_type()),
        _ => String::new(),
    }
}

/// Type of one batch or copy item
fn item_type(query: &Query) -> String {
    match &query.params {
        ParamShape::None => "()".to_string(),
        ParamShape::Inline { fields } if fields.len() == 1 => fields[0].ty.rust_type(),
        ParamShape::Inline { fields } => format!(
            "({})",
            fields
                .iter()
                .map(|f| f.ty.rust_type())
                .collect::<Vec<_>>()
                .join(", ")
        ),
        ParamShape::Struct { name, .. } => name.clone(),
    }
}

fn eval_args(query: &Query) -> String {
    let mut args = vec!["&self".to_string()];
    match query.kind {
        QueryKind::CopyFrom => args.push(format!("rows: ::std::vec::Vec<{}>", item_type(query))),
        kind if kind.is_batch() => args.push(format!("items: ::std::vec::Vec<{}>", item_type(query))),
        _ => match &query.params {
            ParamShape::None => {}
            ParamShape::Inline { fields } => {
                args.extend(fields.iter().map(|f| format!("{}: {}", f.ident, f.ty.rust_type())))
            }
            ParamShape::Struct { name, .. } => args.push(format!("params: {}", name)),
        },
    }
    args.join(", ")
}

fn return_type(query: &Query) -> String {
    let row = row_type(query).unwrap_or_else(|| "()".to_string());
    let inner = match query.kind {
        QueryKind::One => row,
        QueryKind::Many => format!("::std::vec::Vec<{}>", row),
        QueryKind::Exec => "()".to_string(),
        QueryKind::ExecRows | QueryKind::CopyFrom => "u64".to_string(),
        QueryKind::ExecResult => "rt::ExecResult".to_string(),
        QueryKind::ExecLastId => "i64".to_string(),
        QueryKind::BatchExec => "rt::BatchResults<()>".to_string(),
        QueryKind::BatchOne => format!("rt::BatchResults<{}>", row),
        QueryKind::BatchMany => format!("rt::BatchResults<::std::vec::Vec<{}>>", row),
    };
    format!("rt::Result<{}>", inner)
}

/// Argument expressions in placeholder order, reading from `source`
///
/// `source` is `None` for inline arguments, `params`, `item` or `row`
/// otherwise.
fn bound_values(query: &Query, source: Option<&str>) -> Vec<String> {
    let inline_tuple = matches!(&query.params, ParamShape::Inline { fields } if fields.len() > 1);

    query
        .arg_bindings
        .iter()
        .map(|binding| match (source, &query.params) {
            (None, _) => format!("{}.to_sql()", binding.field),
            (Some(item), ParamShape::Inline { .. }) if inline_tuple => {
                format!("{}.{}.to_sql()", item, binding.param_index)
            }
            (Some(item), ParamShape::Inline { .. }) => format!("{}.to_sql()", item),
            (Some(item), _) => format!("{}.{}.to_sql()", item, binding.field),
        })
        .collect()
}

fn slice(values: &[String]) -> String {
    format!("&[{}]", values.join(", "))
}

fn eval_body(query: &Query) -> Vec<String> {
    let sql = &query.const_name;
    let decode = decoder(query);

    let direct_source = match &query.params {
        ParamShape::Struct { .. } => Some("params"),
        _ => None,
    };
    let args = slice(&bound_values(query, direct_source));

    match query.kind {
        QueryKind::One => vec![
            format!("let row = self.executor.query_row({}, {}).await?;", sql, args),
            format!("{}(&row)", decode),
        ],
        QueryKind::Many => vec![
            format!("let rows = self.executor.query({}, {}).await?;", sql, args),
            format!("rows.iter().map({}).collect()", decode),
        ],
        QueryKind::Exec => vec![
            format!("self.executor.execute({}, {}).await?;", sql, args),
            "Ok(())".to_string(),
        ],
        QueryKind::ExecRows => vec![
            format!("let result = self.executor.execute({}, {}).await?;", sql, args),
            "Ok(result.rows_affected())".to_string(),
        ],
        QueryKind::ExecResult => vec![format!("self.executor.execute({}, {}).await", sql, args)],
        QueryKind::ExecLastId => vec![
            format!("let result = self.executor.execute({}, {}).await?;", sql, args),
            "result".to_string(),
            "    .last_insert_id()".to_string(),
            "    .ok_or_else(|| rt::Error::unsupported(\"backend did not report a last insert id\"))"
                .to_string(),
        ],
        QueryKind::BatchExec | QueryKind::BatchOne | QueryKind::BatchMany => {
            let (mode, decode_reply) = match query.kind {
                QueryKind::BatchExec => ("Exec", "rt::BatchReply::into_exec".to_string()),
                QueryKind::BatchOne => (
                    "QueryRow",
                    format!("|reply| reply.into_row().and_then(|row| {}(&row))", decode),
                ),
                _ => (
                    "Query",
                    format!(
                        "|reply| reply.into_rows().and_then(|rows| rows.iter().map({}).collect())",
                        decode
                    ),
                ),
            };
            vec![
                "let items: ::std::vec::Vec<::std::vec::Vec<rt::SqlValue>> = items".to_string(),
                "    .into_iter()".to_string(),
                format!("    .map(|item| vec![{}])", bound_values(query, Some("item")).join(", ")),
                "    .collect();".to_string(),
                format!(
                    "let replies = self.executor.send_batch({}, rt::BatchMode::{}, items).await?;",
                    sql, mode
                ),
                format!("Ok(rt::BatchResults::from_replies(replies, {}))", decode_reply),
            ]
        }
        QueryKind::CopyFrom => {
            let columns: Vec<String> = query.copy_columns.iter().map(|c| format!("{:?}", c)).collect();
            let values: Vec<String> = query
                .params
                .fields()
                .iter()
                .map(|f| format!("row.{}.to_sql()", f.ident))
                .collect();
            let table = query.insert_into_table.as_deref().unwrap_or_default();
            vec![
                "let rows: ::std::vec::Vec<::std::vec::Vec<rt::SqlValue>> = rows".to_string(),
                "    .into_iter()".to_string(),
                format!("    .map(|row| vec![{}])", values.join(", ")),
                "    .collect();".to_string(),
                "self.executor".to_string(),
                format!("    .copy_from({:?}, {}, rows)", table, slice(&columns)),
                "    .await".to_string(),
                "    .into_result()".to_string(),
            ]
        }
    }
}
