use quill::config::{ConnectionConfig, Driver};
use quill::schema::{Blueprint, ForeignKey, MySqlSchemaGrammar, SchemaGrammar};
use quill::sql::Value;

fn config() -> ConnectionConfig {
    ConnectionConfig::new(Driver::MySql, "app")
}

fn compile(table: &mut Blueprint) -> Vec<String> {
    table.to_sql(&config(), &MySqlSchemaGrammar::default()).unwrap()
}

#[test]
fn test_drop_and_rename_columns() {
    let mut table = Blueprint::new("users");
    table.drop_column(["nick", "bio"]);
    table.rename_column("name", "full_name");
    assert_eq!(
        compile(&mut table),
        vec![
            "alter table `users` drop `nick`, drop `bio`",
            "alter table `users` rename column `name` to `full_name`",
        ]
    );
}

#[test]
fn test_change_uses_modify() {
    let mut table = Blueprint::new("users");
    table.string("name", 100).nullable().change();
    assert_eq!(
        compile(&mut table),
        vec!["alter table `users` modify `name` varchar(100) null"]
    );
}

#[test]
fn test_foreign_key_with_actions() {
    let mut table = Blueprint::new("posts");
    table.foreign(
        ForeignKey::new(["user_id"])
            .on("users")
            .cascade_on_delete()
            .on_update("restrict"),
    );
    assert_eq!(
        compile(&mut table),
        vec!["alter table `posts` add constraint `posts_user_id_foreign` foreign key (`user_id`) references `users` (`id`) on delete cascade on update restrict"]
    );
}

#[test]
fn test_index_drops() {
    let mut table = Blueprint::new("users");
    table.drop_primary(None);
    table.drop_unique("users_email_unique");
    table.drop_foreign("users_team_id_foreign");
    table.rename_index("old_idx", "new_idx");
    assert_eq!(
        compile(&mut table),
        vec![
            "alter table `users` drop primary key",
            "alter table `users` drop index `users_email_unique`",
            "alter table `users` drop foreign key `users_team_id_foreign`",
            "alter table `users` rename index `old_idx` to `new_idx`",
        ]
    );
}

#[test]
fn test_column_types() {
    let mut table = Blueprint::new("items");
    table.create();
    table.enumeration("status", ["draft", "live"]).default("draft");
    table.decimal("price", 8, 2).unsigned();
    table.boolean("active").default(true);
    table.uuid("token");
    assert_eq!(
        compile(&mut table),
        vec!["create table `items` (`status` enum('draft', 'live') not null default 'draft', `price` decimal(8, 2) unsigned not null, `active` tinyint(1) not null default '1', `token` char(36) not null)"]
    );
}

#[test]
fn test_temporary_table_and_comment() {
    let mut table = Blueprint::new("scratch");
    table.create();
    table.temporary();
    table.integer("n");
    table.comment("work area");
    assert_eq!(
        compile(&mut table),
        vec![
            "create temporary table `scratch` (`n` int not null)",
            "alter table `scratch` comment = 'work area'",
        ]
    );
}

#[test]
fn test_introspection() {
    let grammar = MySqlSchemaGrammar::new("app_");
    let exists = grammar.compile_table_exists(&config(), "users");
    assert_eq!(
        exists.bindings,
        vec![Value::Text("app".into()), Value::Text("app_users".into())]
    );
    assert_eq!(
        grammar.compile_drop_all_tables(&["a".into(), "b".into()]),
        vec!["drop table `a`,`b`"]
    );
    assert_eq!(
        grammar.compile_disable_foreign_key_constraints(),
        "SET FOREIGN_KEY_CHECKS=0;"
    );
}
