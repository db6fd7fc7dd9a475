//! A connection that records statements instead of running them.

use std::cell::RefCell;

use tracing::info;

use super::Connection;
use crate::config::ConnectionConfig;
use crate::error::Result;
use crate::sql::{CompiledQuery, Row, Value};

/// Records every statement it is asked to execute and returns no rows.
///
/// Useful for printing the SQL a migration or query would run against any
/// dialect.
#[derive(Debug)]
pub struct PretendConnection {
    config: ConnectionConfig,
    log: RefCell<Vec<CompiledQuery>>,
}

impl PretendConnection {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            log: RefCell::new(Vec::new()),
        }
    }

    /// Every statement executed so far, in order.
    pub fn logged(&self) -> Vec<CompiledQuery> {
        self.log.borrow().clone()
    }
}

impl Connection for PretendConnection {
    fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn execute(&self, sql: &str, bindings: &[Value]) -> Result<Vec<Row>> {
        info!(sql, "pretending to execute");
        self.log
            .borrow_mut()
            .push(CompiledQuery::new(sql, bindings.to_vec()));
        Ok(Vec::new())
    }

    fn last_insert_id(&self) -> Result<i64> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Driver;

    #[test]
    fn test_records_statements() {
        let conn = PretendConnection::new(ConnectionConfig::new(Driver::SqlServer, "app"));
        conn.savepoint("trans2").unwrap();
        conn.rollback_to_savepoint("trans2").unwrap();
        let sql: Vec<String> = conn.logged().into_iter().map(|q| q.sql).collect();
        assert_eq!(sql, vec!["SAVE TRANSACTION trans2", "ROLLBACK TRANSACTION trans2"]);
    }
}
