//! Template sources, compiled into the binary

/// Enums and table structs
pub const MODELS_TEMPLATE: &str = include_str!("templates/models.hbs");

/// Params and row structs, SQL constants and query wrappers of one file
pub const QUERIES_TEMPLATE: &str = include_str!("templates/queries.hbs");

/// Module root
pub const MOD_TEMPLATE: &str = include_str!("templates/mod.hbs");

/// Struct definition shared by models and query files
pub const STRUCT_PARTIAL: &str = include_str!("templates/struct.hbs");
