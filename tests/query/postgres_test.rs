use quill::sql::{record, Conditions, Dialect, Query, QueryGrammar, Value};

fn grammar() -> Box<dyn QueryGrammar> {
    Dialect::Postgres.query_grammar("")
}

#[test]
fn test_distinct_on() {
    let query = Query::table("posts")
        .select(["author_id", "title"])
        .distinct_on(["author_id"]);
    assert_eq!(
        query.to_sql(grammar().as_ref()).unwrap().sql,
        "select distinct on (\"author_id\") \"author_id\", \"title\" from \"posts\""
    );
}

#[test]
fn test_insert_get_id_returns_sequence() {
    let values = record([("email", "a@x")]);
    assert_eq!(
        grammar()
            .compile_insert_get_id(&Query::table("users"), &values, None)
            .unwrap(),
        "insert into \"users\" (\"email\") values (?) returning \"id\""
    );
}

#[test]
fn test_update_with_join_filters_on_ctid() {
    let query = Query::table("users")
        .join("orders", "users.id", "=", "orders.user_id")
        .where_("orders.total", ">", 100);
    let values = record([("users.vip", 1)]);
    let g = grammar();

    assert_eq!(
        g.compile_update(&query, &values).unwrap(),
        "update \"users\" set \"vip\" = ? where \"ctid\" in (select \"users\".\"ctid\" from \"users\" inner join \"orders\" on \"users\".\"id\" = \"orders\".\"user_id\" where \"orders\".\"total\" > ?)"
    );
    assert_eq!(
        g.prepare_bindings_for_update(&query.bindings, &values),
        vec![Value::Int(1), Value::Int(100)]
    );
}

#[test]
fn test_insert_or_ignore_is_unsupported() {
    let values = [record([("email", "a@x")])];
    assert!(grammar()
        .compile_insert_or_ignore(&Query::table("users"), &values)
        .is_err());
}

#[test]
fn test_truncate_restarts_identity() {
    let statements = grammar().compile_truncate(&Query::table("users")).unwrap();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].sql, "truncate \"users\" restart identity cascade");
}

#[test]
fn test_json_contains() {
    let query = Query::table("users").where_json_contains("options->languages", serde_json::json!(["en"]));
    let compiled = query.to_sql(grammar().as_ref()).unwrap();
    assert_eq!(
        compiled.sql,
        "select * from \"users\" where (\"options\"->'languages')::jsonb @> ?"
    );
    assert_eq!(compiled.bindings, vec![Value::Text("[\"en\"]".into())]);
}
