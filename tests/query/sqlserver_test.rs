use quill::sql::{Conditions, Dialect, Query, QueryGrammar, Value};
use quill::GrammarError;

fn grammar() -> Box<dyn QueryGrammar> {
    Dialect::SqlServer.query_grammar("")
}

#[test]
fn test_page_uses_row_number_window() {
    let query = Query::table("users").order_by_desc("created_at").for_page(3, 10);
    assert_eq!(
        query.to_sql(grammar().as_ref()).unwrap().sql,
        "select * from (select *, row_number() over (order by [created_at] desc) as row_num from [users]) as temp_table where row_num between 21 and 30 order by row_num"
    );
}

#[test]
fn test_offset_without_limit_is_open_ended() {
    let query = Query::table("users").order_by_desc("id").offset(20);
    assert!(query
        .to_sql(grammar().as_ref())
        .unwrap()
        .sql
        .ends_with("where row_num >= 21 order by row_num"));
}

#[test]
fn test_limit_alone_uses_top() {
    let query = Query::table("users").where_("active", "=", 1).limit(5);
    let compiled = query.to_sql(grammar().as_ref()).unwrap();
    assert_eq!(compiled.sql, "select top 5 * from [users] where [active] = ?");
    assert_eq!(compiled.bindings, vec![Value::Int(1)]);
}

#[test]
fn test_exists_selects_top_one() {
    let query = Query::table("users").where_("id", "=", 1);
    assert_eq!(
        grammar().compile_exists(&query).unwrap(),
        "select top 1 1 [exists] from [users] where [id] = ?"
    );
}

#[test]
fn test_delete_with_limit_uses_top() {
    let query = Query::table("users").where_("active", "=", 0).limit(5);
    assert_eq!(
        grammar().compile_delete(&query).unwrap(),
        "delete top (5) from [users] where [active] = ?"
    );
}

#[test]
fn test_insert_or_ignore_is_unsupported() {
    let err = grammar()
        .compile_insert_or_ignore(&Query::table("users"), &[])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "This database engine does not support inserting while ignoring errors."
    );
}

#[test]
fn test_savepoints() {
    let g = grammar();
    assert_eq!(g.compile_savepoint("trans2"), "SAVE TRANSACTION trans2");
    assert_eq!(
        g.compile_savepoint_rollback("trans2"),
        "ROLLBACK TRANSACTION trans2"
    );
}

#[test]
fn test_offset_before_union_is_rejected() {
    let query = Query::table("a")
        .where_("x", "=", 1)
        .offset(5)
        .union(Query::table("b").where_("y", "=", 2));
    assert_eq!(
        query.to_sql(grammar().as_ref()).unwrap_err(),
        GrammarError::Unsupported("offsets on the first query of a union")
    );
}

#[test]
fn test_paging_a_union_is_rejected() {
    let query = Query::table("a").union(Query::table("b")).limit(10);
    assert!(matches!(
        query.to_sql(grammar().as_ref()),
        Err(GrammarError::Unsupported(_))
    ));
}

#[test]
fn test_plain_union_wraps_each_select() {
    let query = Query::table("a")
        .where_("x", "=", 1)
        .union(Query::table("b").where_("y", "=", 2));
    let compiled = query.to_sql(grammar().as_ref()).unwrap();
    assert_eq!(
        compiled.sql,
        "select * from (select * from [a] where [x] = ?) as [temp_table] union select * from (select * from [b] where [y] = ?) as [temp_table]"
    );
    assert_eq!(compiled.bindings, vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn test_huge_offset_is_an_invalid_query() {
    let query = Query::table("t").order_by_desc("id").offset(u64::MAX).limit(5);
    assert!(matches!(
        query.to_sql(grammar().as_ref()),
        Err(GrammarError::InvalidQuery(_))
    ));
}
