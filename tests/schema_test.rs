use rustf_querygen::types::TypeSource;
use rustf_querygen::{
    build_package, Catalog, Column, Config, Engine, EnumType, GenerateError, GenerationRequest,
    SchemaModel, Table,
};

fn orders_catalog() -> Catalog {
    Catalog {
        tables: vec![Table::new(
            "orders",
            vec![
                Column::new("id", "bigint"),
                Column::new("user_id", "bigint"),
                Column::new("created_at", "timestamptz"),
                Column::new("note", "text").nullable(),
            ],
        )],
        ..Default::default()
    }
}

#[test]
fn test_table_becomes_singular_struct() {
    let config = Config::new("db");
    let schema = SchemaModel::build(&orders_catalog(), &config).unwrap();

    assert_eq!(schema.structs.len(), 1);
    let order = &schema.structs[0];
    assert_eq!(order.name, "Order");
    assert_eq!(order.table(), Some("orders"));

    let names: Vec<&str> = order.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["ID", "UserID", "CreatedAt", "Note"]);

    let idents: Vec<&str> = order.fields.iter().map(|f| f.ident.as_str()).collect();
    assert_eq!(idents, vec!["id", "user_id", "created_at", "note"]);

    assert_eq!(order.fields[0].ty.rust_type(), "i64");
    assert_eq!(
        order.fields[2].ty.rust_type(),
        "::chrono::DateTime<::chrono::Utc>"
    );
    assert_eq!(
        order.fields[3].ty.rust_type(),
        "::std::option::Option<::std::string::String>"
    );
}

#[test]
fn test_exact_table_names() {
    let mut config = Config::new("db");
    config.emit_exact_table_names = true;

    let schema = SchemaModel::build(&orders_catalog(), &config).unwrap();
    assert_eq!(schema.structs[0].name, "Orders");
}

#[test]
fn test_non_default_schema_is_prefixed() {
    let mut table = Table::new("users", vec![Column::new("id", "bigint")]);
    table.schema = Some("audit".to_string());
    let catalog = Catalog {
        tables: vec![table],
        ..Default::default()
    };

    let schema = SchemaModel::build(&catalog, &Config::new("db")).unwrap();
    assert_eq!(schema.structs[0].name, "AuditUser");
}

#[test]
fn test_colliding_tables_name_both_sources() {
    let catalog = Catalog {
        tables: vec![
            Table::new("user", vec![Column::new("id", "bigint")]),
            Table::new("User", vec![Column::new("id", "bigint")]),
        ],
        ..Default::default()
    };
    let request = GenerationRequest::new(catalog, Vec::new(), Config::new("db"));

    match build_package(&request) {
        Err(GenerateError::NamingCollision {
            name,
            first,
            second,
        }) => {
            assert_eq!(name, "User");
            assert!(first.contains("\"user\""));
            assert!(second.contains("\"User\""));
        }
        other => panic!("expected a naming collision, got {:?}", other),
    }
}

#[test]
fn test_rename_resolves_collision() {
    let catalog = Catalog {
        tables: vec![
            Table::new("user", vec![Column::new("id", "bigint")]),
            Table::new("User", vec![Column::new("id", "bigint")]),
        ],
        ..Default::default()
    };
    let config = Config::new("db").with_rename("User", "LegacyUser");

    let schema = SchemaModel::build(&catalog, &config).unwrap();
    let names: Vec<&str> = schema.structs.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["User", "LegacyUser"]);
}

#[test]
fn test_enum_columns_map_to_enum_types() {
    let catalog = Catalog {
        enums: vec![EnumType::new("mood", ["happy", "sad", "so-so"])],
        tables: vec![Table::new(
            "people",
            vec![
                Column::new("current_mood", "mood"),
                Column::new("past_moods", "mood").array().nullable(),
            ],
        )],
        ..Default::default()
    };

    let schema = SchemaModel::build(&catalog, &Config::new("db")).unwrap();
    let mood = &schema.enums[0];
    assert_eq!(mood.name, "Mood");
    let values: Vec<&str> = mood.values.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(values, vec!["Happy", "Sad", "SoSo"]);

    let person = &schema.structs[0];
    assert_eq!(person.name, "Person");
    assert_eq!(person.fields[0].ty.rust_type(), "Mood");
    assert_eq!(person.fields[0].ty.source, TypeSource::Enum("mood".to_string()));
    assert_eq!(
        person.fields[1].ty.rust_type(),
        "::std::option::Option<::std::vec::Vec<Mood>>"
    );
}

#[test]
fn test_override_beats_enum() {
    let catalog = Catalog {
        enums: vec![EnumType::new("mood", ["happy"])],
        tables: vec![Table::new(
            "people",
            vec![Column::new("mood", "mood").nullable()],
        )],
        ..Default::default()
    };
    let config = Config::new("db").with_type_override("mood", "String");

    let schema = SchemaModel::build(&catalog, &config).unwrap();
    assert_eq!(
        schema.structs[0].fields[0].ty.rust_type(),
        "::std::option::Option<String>"
    );
}

#[test]
fn test_unmapped_enum_reference_fails() {
    let catalog = Catalog {
        tables: vec![Table::new(
            "people",
            vec![Column::new("mood", "text").with_enum("missing_mood")],
        )],
        ..Default::default()
    };

    match SchemaModel::build(&catalog, &Config::new("db")) {
        Err(GenerateError::UnmappedEnum { reference, context }) => {
            assert_eq!(reference, "missing_mood");
            assert!(context.contains("people"));
        }
        other => panic!("expected an unmapped enum error, got {:?}", other),
    }
}

#[test]
fn test_every_unknown_type_is_reported() {
    let catalog = Catalog {
        tables: vec![
            Table::new("shapes", vec![Column::new("outline", "geometry")]),
            Table::new("places", vec![Column::new("area", "polygon")]),
        ],
        ..Default::default()
    };
    let request = GenerationRequest::new(catalog, Vec::new(), Config::new("db"));

    let error = build_package(&request).unwrap_err();
    let errors = error.errors();
    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .all(|e| matches!(e, GenerateError::UnknownType { .. })));
}

#[test]
fn test_sqlite_integer_is_64_bit() {
    let catalog = Catalog {
        tables: vec![Table::new("counters", vec![Column::new("value", "INTEGER")])],
        ..Default::default()
    };
    let config = Config::new("db").with_engine(Engine::Sqlite);

    let schema = SchemaModel::build(&catalog, &config).unwrap();
    assert_eq!(schema.structs[0].fields[0].ty.rust_type(), "i64");
}

#[test]
fn test_renamed_column_ident_follows_new_name() {
    let catalog = Catalog {
        tables: vec![Table::new(
            "artists",
            vec![Column::new("id", "bigint"), Column::new("spotify_url", "text")],
        )],
        ..Default::default()
    };
    let config = Config::new("db").with_rename("spotify_url", "SpotifyLink");
    let schema = SchemaModel::build(&catalog, &config).unwrap();

    let link = &schema.structs[0].fields[1];
    assert_eq!(link.name, "SpotifyLink");
    assert_eq!(link.ident, "spotify_link");
    assert_eq!(link.column, "spotify_url");
}
