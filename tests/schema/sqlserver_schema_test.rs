use quill::config::{ConnectionConfig, Driver};
use quill::schema::{Blueprint, SchemaGrammar, SqlServerSchemaGrammar};

fn compile(table: &mut Blueprint) -> Vec<String> {
    table
        .to_sql(
            &ConnectionConfig::new(Driver::SqlServer, "app"),
            &SqlServerSchemaGrammar::default(),
        )
        .unwrap()
}

#[test]
fn test_types() {
    let mut table = Blueprint::new("events");
    table.create();
    table.boolean("active");
    table.timestamp("starts_at", Some(3));
    table.timestamp_tz("ends_at", None).nullable();
    table.text("notes");
    table.uuid("token");
    assert_eq!(
        compile(&mut table),
        vec!["create table [events] ([active] bit not null, [starts_at] datetime2(3) not null, [ends_at] datetimeoffset null, [notes] nvarchar(max) not null, [token] uniqueidentifier not null)"]
    );
}

#[test]
fn test_drop_column_drops_default_constraints_first() {
    let mut table = Blueprint::new("users");
    table.drop_column(["nick"]);
    let statements = compile(&mut table);
    assert_eq!(statements.len(), 2);
    assert!(statements[0].starts_with("DECLARE @sql NVARCHAR(MAX) = '';"));
    assert!(statements[0].contains("OBJECT_ID('[dbo].[users]') AND [name] in ('nick')"));
    assert_eq!(statements[1], "alter table [users] drop column [nick]");
}

#[test]
fn test_drop_if_exists_is_guarded() {
    let mut table = Blueprint::new("users");
    table.drop_if_exists();
    assert_eq!(
        compile(&mut table),
        vec!["if exists (select * from sys.sysobjects where id = object_id('users', 'U')) drop table [users]"]
    );
}

#[test]
fn test_keys_and_indexes() {
    let mut table = Blueprint::new("users");
    table.primary(["id"], None);
    table.unique(["email"], None);
    table.drop_index("users_name_index");
    table.rename_index("old", "new");
    assert_eq!(
        compile(&mut table),
        vec![
            "alter table [users] add constraint [users_id_primary] primary key ([id])",
            "create unique index [users_email_unique] on [users] ([email])",
            "drop index [users_name_index] on [users]",
            "sp_rename '[users].[old]', [new], N'INDEX'",
        ]
    );
}

#[test]
fn test_change_alters_each_column() {
    let mut table = Blueprint::new("users");
    table.string("name", 100).change();
    table.integer("age").nullable().change();
    assert_eq!(
        compile(&mut table),
        vec![
            "alter table [users] alter column [name] nvarchar(100) not null",
            "alter table [users] alter column [age] int null",
        ]
    );
}

#[test]
fn test_rename_table() {
    let mut table = Blueprint::new("users");
    table.rename("members");
    assert_eq!(compile(&mut table), vec!["sp_rename [users], [members]"]);
}

#[test]
fn test_foreign_key_toggles() {
    let grammar = SqlServerSchemaGrammar::default();
    assert_eq!(
        grammar.compile_disable_foreign_key_constraints(),
        "EXEC sp_msforeachtable \"ALTER TABLE ? NOCHECK CONSTRAINT all\";"
    );
}
