//! SQLite backend on top of `rusqlite`.
//!
//! Every pooled handle is its own `rusqlite::Connection`. Paths are opened with
//! URI support, so `file:name?mode=memory&cache=shared` lets a whole pool see
//! the same in-memory database.

pub mod config;
pub mod params;
pub mod query;

use std::time::Duration;

use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::backend::{Backend, BackendConnection};
use crate::error::SqlConnectorError;
use crate::results::ResultSet;
use crate::statement::Statement;
use crate::types::SqlSyntax;
use crate::value::Variant;

pub use query::build_result_set;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens `rusqlite` connections to one database path.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    path: String,
}

impl SqliteBackend {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    fn is_memory(&self) -> bool {
        self.path == ":memory:" || self.path.contains("mode=memory")
    }
}

impl Backend for SqliteBackend {
    fn sql_syntax(&self) -> SqlSyntax {
        SqlSyntax::Sqlite
    }

    fn open(&self) -> Result<Box<dyn BackendConnection>, SqlConnectorError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&self.path, flags).map_err(|e| {
            SqlConnectorError::ConnectionError(format!(
                "failed to open SQLite database '{}': {e}",
                self.path
            ))
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        if !self.is_memory() {
            let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
            debug!(path = %self.path, journal_mode = %mode, "opened SQLite connection");
        }
        Ok(Box::new(SqliteConnection { conn }))
    }
}

/// One pooled `rusqlite` connection.
pub struct SqliteConnection {
    conn: Connection,
}

impl SqliteConnection {
    /// Borrow the raw `rusqlite` connection.
    #[must_use]
    pub fn raw(&self) -> &Connection {
        &self.conn
    }
}

impl BackendConnection for SqliteConnection {
    fn begin(&mut self) -> Result<(), SqlConnectorError> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SqlConnectorError> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), SqlConnectorError> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn execute(
        &mut self,
        statement: &mut Statement,
        params: &[Variant],
    ) -> Result<ResultSet, SqlConnectorError> {
        let mut stmt = self.conn.prepare_cached(statement.query_text())?;
        statement.set_prepared(true)?;

        let expected = stmt.parameter_count();
        if expected != params.len() {
            return Err(SqlConnectorError::ParameterError(format!(
                "statement expects {expected} parameters but {} were given",
                params.len()
            )));
        }

        let result = build_result_set(&mut stmt, params)?;
        statement.set_done(true)?;
        Ok(result)
    }

    fn close(self: Box<Self>) {
        if let Err((_, err)) = self.conn.close() {
            debug!(error = %err, "error closing SQLite connection");
        }
    }
}
