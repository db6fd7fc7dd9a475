use quill::config::{ConnectionConfig, Driver};
use quill::schema::{Blueprint, ForeignKey, PostgresSchemaGrammar, SchemaGrammar};
use quill::sql::Value;

fn config() -> ConnectionConfig {
    ConnectionConfig::new(Driver::Postgres, "app")
}

fn compile(table: &mut Blueprint) -> Vec<String> {
    table.to_sql(&config(), &PostgresSchemaGrammar::default()).unwrap()
}

#[test]
fn test_create_with_timestamps() {
    let mut table = Blueprint::new("users");
    table.create();
    table.increments("id");
    table.jsonb("options");
    table.timestamps();
    assert_eq!(
        compile(&mut table),
        vec!["create table \"users\" (\"id\" serial primary key not null, \"options\" jsonb not null, \"created_at\" timestamp without time zone null, \"updated_at\" timestamp without time zone null)"]
    );
}

#[test]
fn test_starting_value_alters_sequence() {
    let mut table = Blueprint::new("users");
    table.create();
    table.id().starting_value(1000);
    let statements = compile(&mut table);
    assert_eq!(statements.len(), 2);
    assert_eq!(
        statements[1],
        "alter sequence users_id_seq restart with 1000"
    );
}

#[test]
fn test_deferrable_foreign_key() {
    let mut table = Blueprint::new("posts");
    table.foreign(
        ForeignKey::new(["user_id"])
            .on("users")
            .deferrable(true)
            .initially_immediate(false),
    );
    assert_eq!(
        compile(&mut table),
        vec!["alter table \"posts\" add constraint \"posts_user_id_foreign\" foreign key (\"user_id\") references \"users\" (\"id\") deferrable initially deferred"]
    );
}

#[test]
fn test_indexes() {
    let mut table = Blueprint::new("places");
    table.spatial_index(["location"], None);
    table.index_using(["tags"], "gin");
    table.drop_primary(None);
    table.drop_index("places_tags_index");
    assert_eq!(
        compile(&mut table),
        vec![
            "create index \"places_location_spatialindex\" on \"places\" using gist (\"location\")",
            "create index \"places_tags_index\" on \"places\" using gin (\"tags\")",
            "alter table \"places\" drop constraint \"places_pkey\"",
            "drop index \"places_tags_index\"",
        ]
    );
}

#[test]
fn test_rename_table_and_index() {
    let mut table = Blueprint::new("users");
    table.rename("members");
    table.rename_index("users_email_unique", "members_email_unique");
    assert_eq!(
        compile(&mut table),
        vec![
            "alter table \"users\" rename to \"members\"",
            "alter index \"users_email_unique\" rename to \"members_email_unique\"",
        ]
    );
}

#[test]
fn test_introspection_binds_catalog_and_schema() {
    let grammar = PostgresSchemaGrammar::default();
    let listing = grammar.compile_column_listing(&config(), "users");
    assert_eq!(
        listing.bindings,
        vec![
            Value::Text("app".into()),
            Value::Text("public".into()),
            Value::Text("users".into())
        ]
    );
    assert_eq!(
        grammar.compile_drop_all_tables(&["a".into(), "b".into()]),
        vec!["drop table \"a\",\"b\" cascade"]
    );
}
