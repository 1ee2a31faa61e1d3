use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::connector::{Connector, PooledConnection, default_connector};
use crate::error::SqlConnectorError;
use crate::results::ResultSet;
use crate::statement::{Statement, StatementType};
use crate::translation::translate_placeholders;
use crate::value::Variant;

static NEXT_TRANSACTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId(u64);

impl TransactionId {
    pub(crate) fn next() -> Self {
        TransactionId(NEXT_TRANSACTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx#{}", self.0)
    }
}

/// Whether a new transaction issues `BEGIN` immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionMode {
    #[default]
    AutoBegin,
    /// The caller must call [`Transaction::begin`].
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    Idle,
    Active,
    Committed,
    RolledBack,
    /// Handle returned to the pool without a commit or rollback.
    Closed,
}

/// A unit of work bound to one pooled connection.
///
/// Committing or rolling back finalizes the transaction and returns its
/// connection to the [`Connector`]; every later call fails with
/// `SqlConnectorError::StateError`. A transaction dropped before being
/// finalized is rolled back.
pub struct Transaction {
    connector: Arc<Connector>,
    id: TransactionId,
    conn: Option<PooledConnection>,
    state: TxState,
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("handle", &self.conn.as_ref().map(|c| c.id))
            .field("state", &self.state)
            .finish()
    }
}

impl Transaction {
    /// Check out a connection from `connector`, blocking until one is free.
    ///
    /// # Errors
    /// See [`Connector::create_transaction`].
    pub fn new(
        connector: &Arc<Connector>,
        mode: TransactionMode,
    ) -> Result<Transaction, SqlConnectorError> {
        connector.create_transaction(mode)
    }

    /// Check out a connection from the process-wide default connector.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ConfigError` if no default connector is set,
    /// otherwise see [`Connector::create_transaction`].
    pub fn with_default_connector(mode: TransactionMode) -> Result<Transaction, SqlConnectorError> {
        let connector = default_connector().ok_or_else(|| {
            SqlConnectorError::ConfigError("no default connector has been set".to_string())
        })?;
        connector.create_transaction(mode)
    }

    pub(crate) fn bind(
        connector: Arc<Connector>,
        id: TransactionId,
        conn: PooledConnection,
    ) -> Self {
        debug!(transaction = %id, handle = %conn.id, "transaction created");
        Self {
            connector,
            id,
            conn: Some(conn),
            state: TxState::Idle,
        }
    }

    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    #[must_use]
    pub fn connector(&self) -> &Arc<Connector> {
        &self.connector
    }

    /// True between a successful `begin` and the commit or rollback.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == TxState::Active
    }

    /// True once committed, rolled back, or closed by the connector.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        matches!(
            self.state,
            TxState::Committed | TxState::RolledBack | TxState::Closed
        )
    }

    /// # Errors
    /// Returns `SqlConnectorError::StateError` if the transaction was already
    /// begun or finalized, or the backend's error if `BEGIN` fails.
    pub fn begin(&mut self) -> Result<(), SqlConnectorError> {
        match self.state {
            TxState::Idle => {}
            TxState::Active => {
                return Err(SqlConnectorError::state("transaction already begun"));
            }
            _ => return Err(self.finalized_error()),
        }
        self.conn_mut()?.conn.begin()?;
        self.state = TxState::Active;
        debug!(transaction = %self.id, "transaction begun");
        Ok(())
    }

    /// Commit and return the connection to the pool.
    ///
    /// If the backend rejects the commit, the transaction is rolled back, its
    /// connection is still returned, and the commit error is reported.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::StateError` if the transaction is not active.
    pub fn commit(&mut self) -> Result<(), SqlConnectorError> {
        self.ensure_active()?;
        let result = self.conn_mut()?.conn.commit();
        match result {
            Ok(()) => {
                self.state = TxState::Committed;
                debug!(transaction = %self.id, "transaction committed");
            }
            Err(ref err) => {
                warn!(transaction = %self.id, error = %err, "commit failed, rolling back");
                if let Err(rollback_err) = self.conn_mut()?.conn.rollback() {
                    warn!(transaction = %self.id, error = %rollback_err, "rollback after failed commit failed");
                }
                self.state = TxState::RolledBack;
            }
        }
        self.close();
        result
    }

    /// Roll back and return the connection to the pool.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::StateError` if the transaction is not active,
    /// or the backend's error (the connection is returned either way).
    pub fn rollback(&mut self) -> Result<(), SqlConnectorError> {
        self.ensure_active()?;
        let result = self.conn_mut()?.conn.rollback();
        self.state = TxState::RolledBack;
        debug!(transaction = %self.id, ok = result.is_ok(), "transaction rolled back");
        self.close();
        result
    }

    /// Create a statement bound to this transaction's connection. Placeholders
    /// are rewritten to the connector's dialect when the connector asks for it.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::StateError` if the transaction is finalized.
    pub fn statement(
        &self,
        kind: StatementType,
        sql: &str,
    ) -> Result<Statement, SqlConnectorError> {
        if self.is_finalized() {
            return Err(self.finalized_error());
        }
        let handle = self.conn_ref()?.id;
        let text = if self.connector.translate_placeholders() {
            translate_placeholders(sql, self.connector.sql_syntax()).into_owned()
        } else {
            sql.to_string()
        };
        Ok(Statement::new(kind, text, handle))
    }

    /// Run `statement` with `params` and collect its rows.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::StateError` if the transaction is not active,
    /// the statement belongs to another connection, or it has already run;
    /// otherwise the backend's error.
    pub fn execute(
        &mut self,
        statement: &mut Statement,
        params: &[Variant],
    ) -> Result<ResultSet, SqlConnectorError> {
        self.ensure_active()?;
        let id = self.id;
        let pooled = self.conn_mut()?;
        if statement.handle() != pooled.id {
            return Err(SqlConnectorError::state(format!(
                "statement is bound to {} but {id} uses {}",
                statement.handle(),
                pooled.id
            )));
        }
        if statement.done() {
            return Err(SqlConnectorError::state(
                "statement has already been executed to completion",
            ));
        }
        debug!(
            transaction = %id,
            kind = ?statement.statement_type(),
            sql = statement.query_text(),
            params = params.len(),
            "executing statement"
        );
        pooled.conn.execute(statement, params)
    }

    /// Create, execute and discard a statement whose kind is inferred from `sql`.
    ///
    /// # Errors
    /// See [`Transaction::execute`].
    pub fn exec(&mut self, sql: &str, params: &[Variant]) -> Result<ResultSet, SqlConnectorError> {
        let mut statement = self.statement(StatementType::infer(sql), sql)?;
        self.execute(&mut statement, params)
    }

    /// Alias of [`Transaction::exec`] that reads better for `SELECT`s.
    ///
    /// # Errors
    /// See [`Transaction::execute`].
    pub fn query(&mut self, sql: &str, params: &[Variant]) -> Result<ResultSet, SqlConnectorError> {
        self.exec(sql, params)
    }

    /// Hand the connection to the connector's checkin path. Rolls back first if
    /// the transaction is still active.
    pub(crate) fn release(&mut self) -> Option<PooledConnection> {
        let mut pooled = self.conn.take()?;
        if self.state == TxState::Active {
            if let Err(err) = pooled.conn.rollback() {
                warn!(transaction = %self.id, error = %err, "rollback on close failed");
            }
            self.state = TxState::RolledBack;
        } else if !self.is_finalized() {
            self.state = TxState::Closed;
        }
        Some(pooled)
    }

    fn close(&mut self) {
        let connector = Arc::clone(&self.connector);
        if !connector.close_transaction(self) {
            warn!(transaction = %self.id, "connector did not recognize transaction on close");
        }
    }

    fn ensure_active(&self) -> Result<(), SqlConnectorError> {
        match self.state {
            TxState::Active => Ok(()),
            TxState::Idle => Err(SqlConnectorError::state("transaction has not been begun")),
            _ => Err(self.finalized_error()),
        }
    }

    fn finalized_error(&self) -> SqlConnectorError {
        let how = match self.state {
            TxState::Committed => "committed",
            TxState::RolledBack => "rolled back",
            _ => "closed",
        };
        SqlConnectorError::state(format!("transaction {} was already {how}", self.id))
    }

    fn conn_ref(&self) -> Result<&PooledConnection, SqlConnectorError> {
        self.conn.as_ref().ok_or_else(|| self.finalized_error())
    }

    fn conn_mut(&mut self) -> Result<&mut PooledConnection, SqlConnectorError> {
        if self.conn.is_none() {
            return Err(self.finalized_error());
        }
        self.conn.as_mut().ok_or_else(|| {
            SqlConnectorError::state("transaction has no connection")
        })
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.conn.is_some() {
            if self.state == TxState::Active {
                debug!(transaction = %self.id, "dropping active transaction, rolling back");
            }
            self.close();
        }
    }
}
