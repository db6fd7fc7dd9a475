use quill::sql::{record, Conditions, Dialect, Query, QueryGrammar, UpsertColumn, Value};

fn grammar() -> Box<dyn QueryGrammar> {
    Dialect::Sqlite.query_grammar("")
}

#[test]
fn test_delete_with_limit_filters_on_rowid() {
    let query = Query::table("users").where_("active", "=", 0).limit(5);
    assert_eq!(
        grammar().compile_delete(&query).unwrap(),
        "delete from \"users\" where \"rowid\" in (select \"users\".\"rowid\" from \"users\" where \"active\" = ? limit 5)"
    );
}

#[test]
fn test_plain_delete() {
    let query = Query::table("users").where_("id", "=", 3);
    assert_eq!(
        grammar().compile_delete(&query).unwrap(),
        "delete from \"users\" where \"id\" = ?"
    );
}

#[test]
fn test_insert_or_ignore() {
    let values = [record([("email", "a@x")])];
    assert_eq!(
        grammar()
            .compile_insert_or_ignore(&Query::table("users"), &values)
            .unwrap(),
        "insert or ignore into \"users\" (\"email\") values (?)"
    );
}

#[test]
fn test_upsert_on_conflict() {
    let values = [record([("email", Value::from("a@x")), ("votes", Value::from(1))])];
    let update = [
        UpsertColumn::Inserted("votes".into()),
        UpsertColumn::Set("seen".into(), Value::Int(1).into()),
    ];
    assert_eq!(
        grammar()
            .compile_upsert(&Query::table("users"), &values, &["email".into()], &update)
            .unwrap(),
        "insert into \"users\" (\"email\", \"votes\") values (?, ?) on conflict (\"email\") do update set \"votes\" = \"excluded\".\"votes\", \"seen\" = ?"
    );
}

#[test]
fn test_truncate_resets_sequence() {
    let statements = grammar().compile_truncate(&Query::table("users")).unwrap();
    assert_eq!(statements.len(), 2);
    assert_eq!(
        statements[0].sql,
        "delete from sqlite_sequence where name = ?"
    );
    assert_eq!(statements[0].bindings, vec![Value::Text("users".into())]);
    assert_eq!(statements[1].sql, "delete from \"users\"");
}

#[test]
fn test_unions_wrap_in_subselects() {
    let query = Query::table("a").union(Query::table("b"));
    assert_eq!(
        query.to_sql(grammar().as_ref()).unwrap().sql,
        "select * from (select * from \"a\") union select * from (select * from \"b\")"
    );
}
