use quill::sql::{record, Conditions, Dialect, Direction, Query, QueryGrammar, UpsertColumn, Value};

fn grammar() -> Box<dyn QueryGrammar> {
    Dialect::MySql.query_grammar("")
}

#[test]
fn test_nested_where_with_order_and_paging() {
    let query = Query::table("users")
        .where_nested(|q| q.where_("age", ">", 18).or_where("age", "<", 5))
        .where_("active", "=", 1)
        .order_by("name", Direction::Asc)
        .limit(10)
        .offset(5);

    let compiled = query.to_sql(grammar().as_ref()).unwrap();
    assert_eq!(
        compiled.sql,
        "select * from `users` where (`age` > ? or `age` < ?) and `active` = ? order by `name` asc limit 10 offset 5"
    );
    assert_eq!(
        compiled.bindings,
        vec![Value::Int(18), Value::Int(5), Value::Int(1)]
    );
}

#[test]
fn test_insert_ignore() {
    let values = [record([("email", "a@x")])];
    assert_eq!(
        grammar()
            .compile_insert_or_ignore(&Query::table("users"), &values)
            .unwrap(),
        "insert ignore into `users` (`email`) values (?)"
    );
}

#[test]
fn test_upsert_uses_on_duplicate_key() {
    let values = [record([("email", "a@x"), ("name", "A")])];
    let update = [UpsertColumn::Inserted("name".into())];
    assert_eq!(
        grammar()
            .compile_upsert(&Query::table("users"), &values, &["email".into()], &update)
            .unwrap(),
        "insert into `users` (`email`, `name`) values (?, ?) on duplicate key update `name` = values(`name`)"
    );
}

#[test]
fn test_join_update() {
    let query = Query::table("users")
        .join("orders", "users.id", "=", "orders.user_id")
        .where_("orders.total", ">", 100);
    let values = record([("users.vip", 1)]);
    let g = grammar();

    assert_eq!(
        g.compile_update(&query, &values).unwrap(),
        "update `users` inner join `orders` on `users`.`id` = `orders`.`user_id` set `users`.`vip` = ? where `orders`.`total` > ?"
    );
    assert_eq!(
        g.prepare_bindings_for_update(&query.bindings, &values),
        vec![Value::Int(1), Value::Int(100)]
    );
}

#[test]
fn test_locks() {
    let g = grammar();
    let query = Query::table("users").where_("id", "=", 1);
    assert_eq!(
        g.compile_select(&query.clone().lock_for_update()).unwrap(),
        "select * from `users` where `id` = ? for update"
    );
    assert_eq!(
        g.compile_select(&query.shared_lock()).unwrap(),
        "select * from `users` where `id` = ? lock in share mode"
    );
}
