use quill::config::ConnectionConfig;
use quill::schema::{Blueprint, ForeignKey, SchemaGrammar, SqliteSchemaGrammar};
use quill::sql::Value;
use quill::GrammarError;

fn compile(table: &mut Blueprint) -> Result<Vec<String>, GrammarError> {
    table.to_sql(&ConnectionConfig::sqlite_memory(), &SqliteSchemaGrammar::default())
}

#[test]
fn test_create_with_defaults_and_enum() {
    let mut table = Blueprint::new("posts");
    table.create();
    table.id();
    table.enumeration("state", ["open", "closed"]).default("open");
    table.date_time("published_at", None).use_current();
    table.foreign_id("user_id");
    table.foreign(ForeignKey::new(["user_id"]).on("users"));

    assert_eq!(
        compile(&mut table).unwrap(),
        vec!["create table \"posts\" (\"id\" integer not null primary key autoincrement, \"state\" varchar check (\"state\" in ('open', 'closed')) not null default 'open', \"published_at\" datetime default CURRENT_TIMESTAMP not null, \"user_id\" integer not null, foreign key(\"user_id\") references \"users\"(\"id\"))"]
    );
}

#[test]
fn test_indexes_and_drops() {
    let mut table = Blueprint::new("users");
    table.unique(["email"], None);
    table.drop_index("users_name_index");
    table.drop_primary(None);
    table.drop_column(["nick", "bio"]);

    assert_eq!(
        compile(&mut table).unwrap(),
        vec![
            "create unique index \"users_email_unique\" on \"users\" (\"email\")",
            "drop index \"users_name_index\"",
            "alter table \"users\" drop column \"nick\"",
            "alter table \"users\" drop column \"bio\"",
        ]
    );
}

#[test]
fn test_rename_table() {
    let mut table = Blueprint::new("users");
    table.rename("members");
    assert_eq!(
        compile(&mut table).unwrap(),
        vec!["alter table \"users\" rename to \"members\""]
    );
}

#[test]
fn test_multiple_renames_are_rejected() {
    let mut table = Blueprint::new("users");
    table.rename_column("a", "b");
    table.rename_column("c", "d");
    assert!(matches!(
        compile(&mut table),
        Err(GrammarError::InvalidBlueprint(_))
    ));
}

#[test]
fn test_set_columns_are_unsupported() {
    let mut table = Blueprint::new("users");
    table.set("flags", ["a"]);
    assert_eq!(
        compile(&mut table).unwrap_err(),
        GrammarError::Unsupported("set columns")
    );
}

#[test]
fn test_introspection() {
    let grammar = SqliteSchemaGrammar::new("app_");
    let listing = grammar.compile_column_listing(&ConnectionConfig::sqlite_memory(), "users");
    assert_eq!(listing.sql, "select name as column_name from pragma_table_info(?)");
    assert_eq!(listing.bindings, vec![Value::Text("app_users".into())]);
    assert_eq!(
        grammar.compile_drop_all_tables(&["a".into(), "b".into()]),
        vec!["drop table if exists \"a\"", "drop table if exists \"b\""]
    );
}
