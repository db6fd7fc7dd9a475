//! Test utilities for SQL emission validation.
//!
//! Parses compiled SQL with sqlparser-rs so grammar tests catch statements
//! an engine would reject.

use sqlparser::dialect::{MsSqlDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

use super::grammar::Dialect;

/// Validates that a SQL string is syntactically valid for the given dialect.
///
/// Placeholders (`?`) are accepted by every sqlparser dialect used here.
pub fn validate_sql(sql: &str, dialect: Dialect) -> Result<(), String> {
    let parser_dialect: Box<dyn sqlparser::dialect::Dialect> = match dialect {
        Dialect::MySql => Box::new(MySqlDialect {}),
        Dialect::Postgres => Box::new(PostgreSqlDialect {}),
        Dialect::Sqlite => Box::new(SQLiteDialect {}),
        Dialect::SqlServer => Box::new(MsSqlDialect {}),
    };

    Parser::parse_sql(&*parser_dialect, sql)
        .map(|_| ())
        .map_err(|e| format!("Invalid SQL for {}: {}\nSQL: {}", dialect, e, sql))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::condition::Conditions;
    use crate::sql::query::Query;

    #[test]
    fn test_validate_invalid_sql() {
        assert!(validate_sql("SELEC * FORM users", Dialect::Postgres).is_err());
    }

    #[test]
    fn test_compiled_selects_parse() {
        let query = Query::table("users")
            .select(["id", "name"])
            .where_("age", ">", 18)
            .where_in("role", ["admin", "staff"])
            .order_by_desc("id")
            .limit(10);

        for dialect in [Dialect::MySql, Dialect::Sqlite] {
            let sql = query.to_sql(&*dialect.query_grammar("")).unwrap().sql;
            validate_sql(&sql, dialect).unwrap();
        }
    }
}
