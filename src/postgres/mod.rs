//! PostgreSQL backend on top of `tokio-postgres`.
//!
//! The pool API is blocking, so every pooled handle owns a current-thread tokio
//! runtime. The connection future is spawned on that runtime and makes progress
//! whenever the handle blocks on a client call. Do not use this backend from
//! inside another tokio runtime.

pub mod config;
pub mod params;
pub mod query;

use std::collections::HashMap;

use tokio::runtime::{Builder, Runtime};
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, warn};

use crate::backend::{Backend, BackendConnection};
use crate::error::SqlConnectorError;
use crate::results::ResultSet;
use crate::statement::Statement;
use crate::types::SqlSyntax;
use crate::value::Variant;

pub use query::{build_result_set, postgres_extract_value};

/// Opens `tokio-postgres` clients for one parsed connection config.
#[derive(Debug, Clone)]
pub struct PgBackend {
    config: tokio_postgres::Config,
}

impl PgBackend {
    #[must_use]
    pub fn new(config: tokio_postgres::Config) -> Self {
        Self { config }
    }

    /// Parse a libpq-style (`host=... user=...`) or URL connection string.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ConfigError` if the string does not parse.
    pub fn from_conn_str(conn_str: &str) -> Result<Self, SqlConnectorError> {
        let config = conn_str.parse::<tokio_postgres::Config>().map_err(|e| {
            SqlConnectorError::ConfigError(format!("invalid postgres connection string: {e}"))
        })?;
        Ok(Self::new(config))
    }
}

impl Backend for PgBackend {
    fn sql_syntax(&self) -> SqlSyntax {
        SqlSyntax::PostgreSql
    }

    fn open(&self) -> Result<Box<dyn BackendConnection>, SqlConnectorError> {
        let rt = Builder::new_current_thread().enable_all().build().map_err(|e| {
            SqlConnectorError::ConnectionError(format!("failed to start postgres runtime: {e}"))
        })?;
        let (client, connection) = rt.block_on(self.config.connect(NoTls))?;
        rt.spawn(async move {
            if let Err(e) = connection.await {
                warn!(error = %e, "postgres connection closed with error");
            }
        });
        debug!(hosts = ?self.config.get_hosts(), "opened postgres connection");
        Ok(Box::new(PgConnection {
            client,
            rt,
            prepared: StatementCache::new(),
        }))
    }
}

const STATEMENT_CACHE_CAPACITY: usize = 64;

/// Server-side prepared statements of one session, keyed by query text.
#[derive(Debug)]
struct StatementCache<S> {
    entries: HashMap<String, S>,
}

impl<S: Clone> StatementCache<S> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Reuse the session's plan for `statement`'s text, calling `prepare` only
    /// on a miss, and mark the statement prepared.
    fn prepare_with(
        &mut self,
        statement: &mut Statement,
        prepare: impl FnOnce(&str) -> Result<S, SqlConnectorError>,
    ) -> Result<S, SqlConnectorError> {
        if let Some(cached) = self.entries.get(statement.query_text()) {
            let cached = cached.clone();
            statement.set_prepared(true)?;
            return Ok(cached);
        }
        let prepared = prepare(statement.query_text())?;
        if self.entries.len() >= STATEMENT_CACHE_CAPACITY {
            self.entries.clear();
        }
        self.entries
            .insert(statement.query_text().to_string(), prepared.clone());
        statement.set_prepared(true)?;
        Ok(prepared)
    }
}

/// One pooled `tokio-postgres` client and the runtime that drives it.
pub struct PgConnection {
    // Dropped before `rt` so the connection task sees the client go away.
    client: Client,
    rt: Runtime,
    prepared: StatementCache<tokio_postgres::Statement>,
}

impl PgConnection {
    fn batch(&self, sql: &str) -> Result<(), SqlConnectorError> {
        self.rt.block_on(self.client.batch_execute(sql))?;
        Ok(())
    }
}

impl BackendConnection for PgConnection {
    fn begin(&mut self) -> Result<(), SqlConnectorError> {
        self.batch("BEGIN")
    }

    fn commit(&mut self) -> Result<(), SqlConnectorError> {
        self.batch("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), SqlConnectorError> {
        self.batch("ROLLBACK")
    }

    fn execute(
        &mut self,
        statement: &mut Statement,
        params: &[Variant],
    ) -> Result<ResultSet, SqlConnectorError> {
        let stmt = self.prepared.prepare_with(statement, |sql| {
            Ok(self.rt.block_on(self.client.prepare(sql))?)
        })?;

        if stmt.params().len() != params.len() {
            return Err(SqlConnectorError::ParameterError(format!(
                "statement expects {} parameters but {} were given",
                stmt.params().len(),
                params.len()
            )));
        }
        let refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        let result = if stmt.columns().is_empty() {
            let changed = self.rt.block_on(self.client.execute(&stmt, &refs))?;
            let changed = usize::try_from(changed).map_err(|e| {
                SqlConnectorError::ExecutionError(format!(
                    "postgres affected rows conversion error: {e}"
                ))
            })?;
            ResultSet::affected(changed)
        } else {
            let rows = self.rt.block_on(self.client.query(&stmt, &refs))?;
            build_result_set(&stmt, &rows)?
        };
        statement.set_done(true)?;
        Ok(result)
    }
}
