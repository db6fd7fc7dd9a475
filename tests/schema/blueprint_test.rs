use quill::config::{ConnectionConfig, Driver};
use quill::schema::{Blueprint, Command, ForeignKey, IndexKind};
use quill::sql::Dialect;

fn compile(table: &mut Blueprint, dialect: Dialect) -> Vec<String> {
    let config = ConnectionConfig::new(Driver::from(dialect), "app");
    let grammar = dialect.schema_grammar("");
    table.to_sql(&config, grammar.as_ref()).unwrap()
}

#[test]
fn test_columns_without_create_imply_add() {
    let mut table = Blueprint::new("users");
    table.string("nick", 50);
    table.index(["nick"], None);

    for dialect in Dialect::ALL {
        let mut copy = table.clone();
        let statements = compile(&mut copy, dialect);
        assert!(
            statements[0].starts_with("alter table"),
            "{}: {:?}",
            dialect,
            statements
        );
        assert!(matches!(copy.commands[0], Command::Add));
    }
}

#[test]
fn test_compiling_twice_is_stable() {
    let mut table = Blueprint::new("users");
    table.string("email", 255).unique();
    let first = compile(&mut table, Dialect::MySql);
    let second = compile(&mut table, Dialect::MySql);
    assert_eq!(first, second);
    assert_eq!(
        first,
        vec![
            "alter table `users` add `email` varchar(255) not null",
            "alter table `users` add unique `users_email_unique`(`email`)",
        ]
    );
}

#[test]
fn test_fluent_indexes_follow_columns() {
    let mut table = Blueprint::new("posts");
    table.create();
    table.string("slug", 100).unique_named("posts_slug");
    table.integer("rank").index();

    let statements = compile(&mut table, Dialect::Postgres);
    assert_eq!(
        statements,
        vec![
            "create table \"posts\" (\"slug\" varchar(100) not null, \"rank\" integer not null)",
            "alter table \"posts\" add constraint \"posts_slug\" unique (\"slug\")",
            "create index \"posts_rank_index\" on \"posts\" (\"rank\")",
        ]
    );
}

#[test]
fn test_generated_names_include_prefix() {
    let mut table = Blueprint::new("posts").with_prefix("app_");
    table.foreign(ForeignKey::new(["user_id"]).on("users"));
    table.drop_index_on(IndexKind::Unique, ["slug"]);

    match (&table.commands[0], &table.commands[1]) {
        (Command::Foreign(key), Command::DropIndex { name, .. }) => {
            assert_eq!(key.name, "app_posts_user_id_foreign");
            assert_eq!(name, "app_posts_slug_unique");
        }
        other => panic!("unexpected commands: {:?}", other),
    }
}

#[test]
fn test_blueprint_from_json() {
    let json = r#"{
        "table": "users",
        "columns": [
            {"name": "id", "type": "bigInteger", "autoIncrement": true, "unsigned": true},
            {"name": "email", "type": "string", "length": 255, "unique": "default"},
            {"name": "bio", "type": "text", "nullable": true}
        ],
        "commands": [{"command": "create"}]
    }"#;
    let mut table: Blueprint = serde_json::from_str(json).unwrap();

    assert_eq!(
        compile(&mut table, Dialect::Sqlite),
        vec![
            "create table \"users\" (\"id\" integer not null primary key autoincrement, \"email\" varchar not null, \"bio\" text null)",
            "create unique index \"users_email_unique\" on \"users\" (\"email\")",
        ]
    );
}
