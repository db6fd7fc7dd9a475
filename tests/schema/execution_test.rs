use quill::connection::{Connection, PretendConnection, SqliteConnection};
use quill::config::{ConnectionConfig, Driver};
use quill::schema::{Blueprint, SchemaBuilder};
use quill::sql::{record, Conditions, Query, UpsertColumn, Value};
use quill::Error;

fn create_users(conn: &SqliteConnection) {
    SchemaBuilder::new(conn)
        .create("users", |table| {
            table.id();
            table.string("email", 255).unique();
            table.integer("votes").default(0);
            table.timestamps();
        })
        .unwrap();
}

#[test]
fn test_create_and_introspect() {
    let conn = SqliteConnection::open_in_memory_with_prefix("app_").unwrap();
    create_users(&conn);
    let schema = SchemaBuilder::new(&conn);

    assert!(schema.has_table("users").unwrap());
    assert!(!schema.has_table("posts").unwrap());
    assert!(schema.has_columns("users", &["ID", "email", "created_at"]).unwrap());
    assert!(!schema.has_column("users", "nick").unwrap());
    assert_eq!(
        schema.get_column_listing("users").unwrap(),
        vec!["id", "email", "votes", "created_at", "updated_at"]
    );
}

#[test]
fn test_alter_then_query() {
    let conn = SqliteConnection::open_in_memory().unwrap();
    create_users(&conn);
    let schema = SchemaBuilder::new(&conn);
    schema
        .table("users", |table| {
            table.string("nick", 50).nullable();
        })
        .unwrap();
    assert!(schema.has_column("users", "nick").unwrap());

    let users = Query::table("users");
    users
        .insert(
            &conn,
            &[
                record([("email", Value::from("a@x")), ("nick", Value::from("ann"))]),
                record([("email", Value::from("b@x")), ("nick", Value::Null)]),
            ],
        )
        .unwrap();
    assert_eq!(users.clone().where_null("nick").count(&conn).unwrap(), 1);

    let row = users
        .clone()
        .where_("email", "=", "a@x")
        .first(&conn)
        .unwrap()
        .unwrap();
    assert_eq!(row["votes"], Value::Int(0));
}

#[test]
fn test_upsert_updates_on_conflict() {
    let conn = SqliteConnection::open_in_memory().unwrap();
    create_users(&conn);
    let users = Query::table("users");

    users
        .insert(&conn, &[record([("email", Value::from("a@x")), ("votes", Value::from(1))])])
        .unwrap();
    let affected = users
        .upsert(
            &conn,
            &[record([("email", Value::from("a@x")), ("votes", Value::from(7))])],
            &["email".to_string()],
            &[UpsertColumn::from("votes")],
        )
        .unwrap();

    assert_eq!(affected, 1);
    assert_eq!(users.count(&conn).unwrap(), 1);
    assert_eq!(users.max(&conn, "votes").unwrap(), Value::Int(7));
}

#[test]
fn test_unique_index_is_enforced() {
    let conn = SqliteConnection::open_in_memory().unwrap();
    create_users(&conn);
    let users = Query::table("users");
    users.insert(&conn, &[record([("email", "a@x")])]).unwrap();

    let err = users.insert(&conn, &[record([("email", "a@x")])]).unwrap_err();
    match err {
        Error::Query { sql, .. } => assert!(sql.starts_with("insert into \"users\"")),
        other => panic!("expected a query error, got {:?}", other),
    }

    users
        .insert_or_ignore(&conn, &[record([("email", "a@x")])])
        .unwrap();
    assert_eq!(users.count(&conn).unwrap(), 1);
}

#[test]
fn test_truncate_resets_ids() {
    let conn = SqliteConnection::open_in_memory().unwrap();
    create_users(&conn);
    let users = Query::table("users");
    users.insert(&conn, &[record([("email", "a@x")])]).unwrap();
    users.truncate(&conn).unwrap();

    let id = users
        .insert_get_id(&conn, &record([("email", "b@x")]), None)
        .unwrap();
    assert_eq!(id, 1);
}

#[test]
fn test_rename_and_drop_all_tables() {
    let conn = SqliteConnection::open_in_memory().unwrap();
    create_users(&conn);
    let schema = SchemaBuilder::new(&conn);
    schema
        .create("posts", |table| {
            table.id();
            table.string("title", 100);
        })
        .unwrap();
    schema.rename("posts", "articles").unwrap();

    let mut tables = schema.get_all_tables().unwrap();
    tables.sort();
    assert_eq!(tables, vec!["articles", "users"]);

    schema.drop_all_tables().unwrap();
    assert!(schema.get_all_tables().unwrap().is_empty());
}

#[test]
fn test_invalid_blueprint_runs_nothing() {
    let conn = SqliteConnection::open_in_memory().unwrap();
    create_users(&conn);
    let err = SchemaBuilder::new(&conn)
        .table("users", |table| {
            table.drop_column(["votes"]);
            table.drop_column(["email"]);
        })
        .unwrap_err();
    assert!(matches!(err, Error::Grammar(_)));
    assert!(SchemaBuilder::new(&conn).has_column("users", "votes").unwrap());
}

#[test]
fn test_pretend_connection_logs_schema() {
    let conn = PretendConnection::new(ConnectionConfig::new(Driver::Postgres, "app"));
    let mut table = Blueprint::new("users");
    table.create();
    table.id();
    table.string("nick", 50).comment("display name");
    table.build(&conn).unwrap();

    let logged: Vec<String> = conn.logged().into_iter().map(|q| q.sql).collect();
    assert_eq!(
        logged,
        vec![
            "create table \"users\" (\"id\" bigserial primary key not null, \"nick\" varchar(50) not null)",
            "comment on column \"users\".\"nick\" is 'display name'",
        ]
    );
    assert_eq!(conn.dialect().name(), "postgres");
}
