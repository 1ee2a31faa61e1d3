use crate::connector::HandleId;
use crate::error::SqlConnectorError;

/// Kind of SQL statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatementType {
    #[default]
    Unknown,
    Select,
    Insert,
    Update,
    Delete,
    /// Schema changes (`CREATE`, `DROP`, `ALTER`, ...).
    Ddl,
}

impl StatementType {
    /// Classify SQL text by its leading keyword, skipping whitespace and comments.
    #[must_use]
    pub fn infer(sql: &str) -> Self {
        let keyword: String = skip_leading_comments(sql)
            .chars()
            .take_while(char::is_ascii_alphabetic)
            .collect::<String>()
            .to_ascii_uppercase();
        match keyword.as_str() {
            "SELECT" | "WITH" | "VALUES" | "PRAGMA" | "EXPLAIN" => StatementType::Select,
            "INSERT" | "REPLACE" => StatementType::Insert,
            "UPDATE" => StatementType::Update,
            "DELETE" => StatementType::Delete,
            "CREATE" | "DROP" | "ALTER" | "TRUNCATE" => StatementType::Ddl,
            _ => StatementType::Unknown,
        }
    }
}

fn skip_leading_comments(mut sql: &str) -> &str {
    loop {
        sql = sql.trim_start();
        if let Some(rest) = sql.strip_prefix("--") {
            sql = rest.split_once('\n').map_or("", |(_, tail)| tail);
        } else if let Some(rest) = sql.strip_prefix("/*") {
            sql = rest.split_once("*/").map_or("", |(_, tail)| tail);
        } else {
            return sql;
        }
    }
}

/// Execution state of one SQL statement, bound to a single pooled connection.
///
/// Statements are created by [`Transaction::statement`](crate::Transaction::statement)
/// and are not `Clone`: each one belongs to the connection it was created on.
/// Backends flip `prepared` once the server has prepared the text and `done`
/// once every row has been produced; neither flag can be cleared again.
#[derive(Debug)]
pub struct Statement {
    kind: StatementType,
    query_text: String,
    prepared: bool,
    done: bool,
    handle: HandleId,
}

impl Statement {
    pub(crate) fn new(kind: StatementType, query_text: String, handle: HandleId) -> Self {
        Self {
            kind,
            query_text,
            prepared: false,
            done: false,
            handle,
        }
    }

    #[must_use]
    pub fn statement_type(&self) -> StatementType {
        self.kind
    }

    #[must_use]
    pub fn prepared(&self) -> bool {
        self.prepared
    }

    /// # Errors
    /// Returns `SqlConnectorError::StateError` when clearing a flag that is already set.
    pub fn set_prepared(&mut self, val: bool) -> Result<(), SqlConnectorError> {
        if self.prepared && !val {
            return Err(SqlConnectorError::state(
                "a prepared statement cannot become unprepared",
            ));
        }
        self.prepared = val;
        Ok(())
    }

    /// True once no more rows can be fetched.
    #[must_use]
    pub fn done(&self) -> bool {
        self.done
    }

    /// # Errors
    /// Returns `SqlConnectorError::StateError` when clearing a flag that is already set.
    pub fn set_done(&mut self, val: bool) -> Result<(), SqlConnectorError> {
        if self.done && !val {
            return Err(SqlConnectorError::state(
                "a finished statement cannot be resumed",
            ));
        }
        self.done = val;
        Ok(())
    }

    #[must_use]
    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    /// The pooled connection this statement is bound to.
    #[must_use]
    pub fn handle(&self) -> HandleId {
        self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_kind_from_leading_keyword() {
        assert_eq!(StatementType::infer("select 1"), StatementType::Select);
        assert_eq!(
            StatementType::infer("  -- note\n/* x */ INSERT INTO t VALUES (1)"),
            StatementType::Insert
        );
        assert_eq!(StatementType::infer("update t set a = 1"), StatementType::Update);
        assert_eq!(StatementType::infer("DELETE FROM t"), StatementType::Delete);
        assert_eq!(
            StatementType::infer("create table t (id int)"),
            StatementType::Ddl
        );
        assert_eq!(StatementType::infer("BEGIN"), StatementType::Unknown);
        assert_eq!(StatementType::infer("-- only a comment"), StatementType::Unknown);
    }

    #[test]
    fn flags_are_monotone() {
        let mut stmt = Statement::new(StatementType::Select, "SELECT 1".into(), HandleId(0));
        assert!(!stmt.prepared());
        assert!(!stmt.done());
        stmt.set_prepared(true).unwrap();
        stmt.set_prepared(true).unwrap();
        assert!(stmt.set_prepared(false).is_err());
        stmt.set_done(true).unwrap();
        assert!(matches!(
            stmt.set_done(false),
            Err(SqlConnectorError::StateError(_))
        ));
        assert!(stmt.prepared() && stmt.done());
        assert_eq!(stmt.query_text(), "SELECT 1");
        assert_eq!(stmt.statement_type(), StatementType::Select);
    }
}
