use quill::config::{ConnectionConfig, Driver};
use quill::connection::PretendConnection;
use quill::sql::{
    record, Conditions, Dialect, Direction, JoinClause, JoinType, Query, QueryGrammar, Value,
};
use quill::GrammarError;

fn compile(dialect: Dialect, query: &Query) -> (String, Vec<Value>) {
    let grammar = dialect.query_grammar("");
    let compiled = query.to_sql(grammar.as_ref()).unwrap();
    (compiled.sql, compiled.bindings)
}

#[test]
fn test_empty_where_in_never_matches() {
    let query = Query::table("users").where_in("id", Vec::<i64>::new());
    for dialect in Dialect::ALL {
        let (sql, bindings) = compile(dialect, &query);
        assert!(sql.ends_with("where 0 = 1"), "{}: {}", dialect, sql);
        assert!(bindings.is_empty());
    }
}

#[test]
fn test_empty_where_not_in_always_matches() {
    let query = Query::table("users").where_not_in("id", Vec::<i64>::new());
    for dialect in Dialect::ALL {
        let (sql, _) = compile(dialect, &query);
        assert!(sql.ends_with("where 1 = 1"), "{}: {}", dialect, sql);
    }
}

#[test]
fn test_leading_boolean_is_stripped() {
    let query = Query::table("users")
        .or_where("name", "=", "a")
        .or_where("name", "=", "b");
    let (sql, _) = compile(Dialect::Postgres, &query);
    assert_eq!(sql, "select * from \"users\" where \"name\" = ? or \"name\" = ?");
}

#[test]
fn test_bindings_follow_placeholder_order() {
    let query = Query::table("users")
        .join_where("posts", "posts.user_id", "=", 9)
        .where_("users.active", "=", true)
        .group_by(["users.id"])
        .having("count", ">", 2)
        .order_by("users.id", Direction::Asc);
    let (sql, bindings) = compile(Dialect::Sqlite, &query);

    assert_eq!(sql.matches('?').count(), bindings.len());
    assert_eq!(bindings, vec![Value::Int(9), Value::Bool(true), Value::Int(2)]);
}

#[test]
fn test_compilation_is_deterministic() {
    let query = Query::table("orders")
        .select(["id", "total"])
        .where_between("total", 10, 20)
        .where_in("status", ["open", "paid"])
        .limit(3);
    for dialect in Dialect::ALL {
        assert_eq!(compile(dialect, &query), compile(dialect, &query));
    }
}

#[test]
fn test_prefix_applies_to_tables_and_qualified_columns() {
    let grammar = Dialect::MySql.query_grammar("app_");
    let query = Query::table("users as u").select(["u.id"]);
    assert_eq!(
        query.to_sql(grammar.as_ref()).unwrap().sql,
        "select `app_u`.`id` from `app_users` as `app_u`"
    );
}

#[test]
fn test_batch_insert_shares_the_first_column_list() {
    let grammar = Dialect::Sqlite.query_grammar("");
    let values = vec![
        record([("name", "a"), ("email", "a@x")]),
        record([("name", "b"), ("email", "b@x")]),
    ];
    assert_eq!(
        grammar.compile_insert(&Query::table("users"), &values).unwrap(),
        "insert into \"users\" (\"email\", \"name\") values (?, ?), (?, ?)"
    );
}

#[test]
fn test_empty_insert_uses_default_values() {
    let grammar = Dialect::Postgres.query_grammar("");
    assert_eq!(
        grammar.compile_insert(&Query::table("users"), &[]).unwrap(),
        "insert into \"users\" default values"
    );
}

#[test]
fn test_query_round_trips_through_json() {
    let query = Query::table("users")
        .where_("votes", ">", 100)
        .or_where_null("deleted_at")
        .order_by_desc("votes")
        .limit(5);
    let json = serde_json::to_string(&query).unwrap();
    let parsed: Query = serde_json::from_str(&json).unwrap();
    assert_eq!(compile(Dialect::MySql, &parsed), compile(Dialect::MySql, &query));
}

#[test]
fn test_nested_join_bindings_come_before_its_on_clause() {
    let join = JoinClause::new(JoinType::Inner, "a")
        .where_("a.x", "=", 1)
        .join(JoinClause::new(JoinType::Inner, "b").where_("b.k", "=", "x"));
    let query = Query::table("t").join_clause(join);
    let (sql, bindings) = compile(Dialect::Sqlite, &query);
    assert_eq!(
        sql,
        "select * from \"t\" inner join (\"a\" inner join \"b\" on \"b\".\"k\" = ?) on \"a\".\"x\" = ?"
    );
    assert_eq!(bindings, vec![Value::Text("x".into()), Value::Int(1)]);
}

#[test]
fn test_single_record_insert_matches_one_record_batch() {
    let row = record([("email", Value::from("a@x")), ("name", Value::from("Ann"))]);
    for dialect in Dialect::ALL {
        let single = PretendConnection::new(ConnectionConfig::new(Driver::from(dialect), "app"));
        let batch = PretendConnection::new(ConnectionConfig::new(Driver::from(dialect), "app"));
        Query::table("users").insert_one(&single, &row).unwrap();
        Query::table("users").insert(&batch, &[row.clone()]).unwrap();
        assert_eq!(single.logged(), batch.logged(), "{}", dialect);
    }
}

#[test]
fn test_batch_insert_rejects_mismatched_columns() {
    let rows = [
        record([("email", Value::from("a@x")), ("name", Value::from("Ann"))]),
        record([("email", Value::from("b@x"))]),
    ];
    for dialect in Dialect::ALL {
        let grammar = dialect.query_grammar("");
        assert!(matches!(
            grammar.compile_insert(&Query::table("users"), &rows),
            Err(GrammarError::InvalidQuery(_))
        ));
    }
}
