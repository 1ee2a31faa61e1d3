//! Fixed-size blocking pool of physical connections.
//!
//! Two locks guard the pool: `pool` (free handles, used handle ids, connected
//! flag) and `transactions` (live transaction registry). Checkout takes `pool`
//! and then, separately, `transactions`; checkin and disconnect take
//! `transactions` before `pool`. The locks are never nested in the opposite order.

mod registry;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

pub use registry::{clear_default_connector, default_connector, set_default_connector};

use crate::backend::{Backend, BackendConnection};
use crate::error::SqlConnectorError;
use crate::transaction::{Transaction, TransactionId, TransactionMode};
use crate::types::SqlSyntax;

/// Largest pool a connector accepts.
pub const MAX_POOL_SIZE: usize = 10;

static NEXT_HANDLE_ID: AtomicUsize = AtomicUsize::new(0);

/// Process-unique identity of one physical connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(pub(crate) usize);

impl HandleId {
    fn next() -> Self {
        HandleId(NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle#{}", self.0)
    }
}

/// A checked-out physical connection.
pub(crate) struct PooledConnection {
    pub(crate) id: HandleId,
    pub(crate) conn: Box<dyn BackendConnection>,
}

impl fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PooledConnection").field(&self.id).finish()
    }
}

#[derive(Debug, Default)]
struct PoolState {
    connected: bool,
    free: Vec<PooledConnection>,
    used: Vec<HandleId>,
}

/// Snapshot of pool bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub size: usize,
    pub free: usize,
    pub used: usize,
    pub transactions: usize,
    pub connected: bool,
}

/// Owns `pool_size` physical connections to one backend and brokers exclusive
/// access to them through [`Transaction`]s.
///
/// ```rust,no_run
/// # #[cfg(feature = "sqlite")]
/// # fn demo() -> Result<(), sql_connector::SqlConnectorError> {
/// use sql_connector::{Connector, TransactionMode};
///
/// let connector = Connector::new_sqlite("app.db", 2)?;
/// connector.connect()?;
/// let mut tx = connector.create_transaction(TransactionMode::AutoBegin)?;
/// tx.exec("CREATE TABLE IF NOT EXISTS city (id INTEGER, name TEXT)", &[])?;
/// tx.commit()?;
/// # Ok(())
/// # }
/// ```
pub struct Connector {
    backend: Box<dyn Backend>,
    pool_size: usize,
    translate_placeholders: bool,
    pool: Mutex<PoolState>,
    handle_freed: Condvar,
    transactions: Mutex<HashMap<TransactionId, HandleId>>,
}

impl fmt::Debug for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("backend", &self.backend)
            .field("pool_size", &self.pool_size)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl Connector {
    /// Create a disconnected connector.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ConfigError` if `pool_size` is outside `1..=10`.
    pub fn new(
        backend: Box<dyn Backend>,
        pool_size: usize,
    ) -> Result<Arc<Connector>, SqlConnectorError> {
        Self::with_options(backend, pool_size, false)
    }

    /// Like [`Connector::new`], optionally rewriting placeholders of every
    /// statement into the backend's dialect.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ConfigError` if `pool_size` is outside `1..=10`.
    pub fn with_options(
        backend: Box<dyn Backend>,
        pool_size: usize,
        translate_placeholders: bool,
    ) -> Result<Arc<Connector>, SqlConnectorError> {
        if pool_size == 0 {
            return Err(SqlConnectorError::ConfigError(
                "pool size must be at least 1".to_string(),
            ));
        }
        if pool_size > MAX_POOL_SIZE {
            return Err(SqlConnectorError::ConfigError(format!(
                "pool size {pool_size} is too large (max {MAX_POOL_SIZE})"
            )));
        }
        Ok(Arc::new(Connector {
            backend,
            pool_size,
            translate_placeholders,
            pool: Mutex::new(PoolState::default()),
            handle_freed: Condvar::new(),
            transactions: Mutex::new(HashMap::new()),
        }))
    }

    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    #[must_use]
    pub fn sql_syntax(&self) -> SqlSyntax {
        self.backend.sql_syntax()
    }

    #[must_use]
    pub fn translate_placeholders(&self) -> bool {
        self.translate_placeholders
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.pool.lock().connected
    }

    #[must_use]
    pub fn status(&self) -> PoolStatus {
        let transactions = self.transactions.lock().len();
        let pool = self.pool.lock();
        PoolStatus {
            size: self.pool_size,
            free: pool.free.len(),
            used: pool.used.len(),
            transactions,
            connected: pool.connected,
        }
    }

    /// Open every pooled connection. Does nothing if already connected.
    ///
    /// # Errors
    /// Returns the backend's error if any connection fails to open; the
    /// connections opened before it are closed again.
    pub fn connect(&self) -> Result<(), SqlConnectorError> {
        let mut pool = self.pool.lock();
        if pool.connected {
            info!("connector already connected");
            return Ok(());
        }

        let mut opened = Vec::with_capacity(self.pool_size);
        for _ in 0..self.pool_size {
            match self.backend.open() {
                Ok(conn) => opened.push(PooledConnection {
                    id: HandleId::next(),
                    conn,
                }),
                Err(err) => {
                    warn!(
                        opened = opened.len(),
                        error = %err,
                        "failed to open pooled connection, closing the rest"
                    );
                    for pooled in opened {
                        pooled.conn.close();
                    }
                    return Err(err);
                }
            }
        }

        pool.free = opened;
        pool.connected = true;
        info!(pool_size = self.pool_size, syntax = ?self.sql_syntax(), "connector connected");
        Ok(())
    }

    /// Close every pooled connection.
    ///
    /// Returns `true` on success or if already disconnected, and `false` without
    /// touching the pool while any transaction is still open.
    pub fn disconnect(&self) -> bool {
        let transactions = self.transactions.lock();
        let mut pool = self.pool.lock();
        if !pool.connected {
            info!("connector was not connected");
            return true;
        }
        if !transactions.is_empty() {
            warn!(
                open = transactions.len(),
                "cannot disconnect: transactions are still open"
            );
            return false;
        }
        if !pool.used.is_empty() {
            // A checkout popped a handle but has not registered its transaction yet.
            warn!(
                used = pool.used.len(),
                "cannot disconnect: a checkout is in progress"
            );
            return false;
        }

        for pooled in pool.free.drain(..) {
            pooled.conn.close();
        }
        pool.connected = false;
        self.handle_freed.notify_all();
        info!("connector disconnected");
        true
    }

    /// Check out a connection and wrap it in a new transaction, waiting for as
    /// long as it takes for a connection to be freed.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ConnectionError` if the connector is (or becomes)
    /// disconnected, or the backend's error if an auto-begin fails.
    pub fn create_transaction(
        self: &Arc<Self>,
        mode: TransactionMode,
    ) -> Result<Transaction, SqlConnectorError> {
        let pooled = self.checkout(None)?;
        self.register(pooled, mode)
    }

    /// Like [`create_transaction`](Self::create_transaction) but gives up after `timeout`.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::PoolTimeout` if no connection was freed in time.
    pub fn create_transaction_timeout(
        self: &Arc<Self>,
        mode: TransactionMode,
        timeout: Duration,
    ) -> Result<Transaction, SqlConnectorError> {
        let pooled = self.checkout(Some(timeout))?;
        self.register(pooled, mode)
    }

    fn checkout(&self, timeout: Option<Duration>) -> Result<PooledConnection, SqlConnectorError> {
        let started = Instant::now();
        let mut pool = self.pool.lock();
        loop {
            if !pool.connected {
                return Err(SqlConnectorError::ConnectionError(
                    "connector is not connected".to_string(),
                ));
            }
            if let Some(pooled) = pool.free.pop() {
                pool.used.push(pooled.id);
                debug!(handle = %pooled.id, free = pool.free.len(), "checked out connection");
                return Ok(pooled);
            }
            // Re-check the predicate after every wake; wakeups may be spurious.
            match timeout {
                Some(timeout) => {
                    let timed_out = self
                        .handle_freed
                        .wait_until(&mut pool, started + timeout)
                        .timed_out();
                    if timed_out && pool.connected && pool.free.is_empty() {
                        return Err(SqlConnectorError::PoolTimeout(timeout));
                    }
                }
                None => self.handle_freed.wait(&mut pool),
            }
        }
    }

    fn register(
        self: &Arc<Self>,
        pooled: PooledConnection,
        mode: TransactionMode,
    ) -> Result<Transaction, SqlConnectorError> {
        let id = TransactionId::next();
        self.transactions.lock().insert(id, pooled.id);
        let mut tx = Transaction::bind(Arc::clone(self), id, pooled);
        if mode == TransactionMode::AutoBegin {
            tx.begin()?;
        }
        Ok(tx)
    }

    /// Return a transaction's connection to the pool, rolling back first if the
    /// transaction is still active.
    ///
    /// Returns `false` if the transaction is not registered with this connector
    /// (already closed, or created by another connector).
    ///
    /// # Panics
    /// Panics if the transaction's handle is missing from the used set, which
    /// means the pool bookkeeping is already corrupt.
    pub fn close_transaction(&self, transaction: &mut Transaction) -> bool {
        let handle_id = {
            let mut transactions = self.transactions.lock();
            match transactions.remove(&transaction.id()) {
                Some(handle_id) => handle_id,
                None => {
                    warn!(transaction = %transaction.id(), "close of an unknown transaction");
                    return false;
                }
            }
        };

        let Some(pooled) = transaction.release() else {
            error!(transaction = %transaction.id(), "registered transaction holds no connection");
            panic!(
                "transaction {} was registered without a connection",
                transaction.id()
            );
        };
        if pooled.id != handle_id {
            error!(expected = %handle_id, actual = %pooled.id, "transaction handle mismatch");
            panic!(
                "transaction {} holds {} but was registered with {}",
                transaction.id(),
                pooled.id,
                handle_id
            );
        }

        let mut pool = self.pool.lock();
        let Some(pos) = pool.used.iter().position(|id| *id == handle_id) else {
            error!(handle = %handle_id, "closed transaction's connection is not in the used set");
            panic!("no such used connection {handle_id} in connection pool");
        };
        pool.used.swap_remove(pos);
        pool.free.push(pooled);
        debug!(handle = %handle_id, free = pool.free.len(), "checked in connection");
        self.handle_freed.notify_all();
        true
    }
}

impl Drop for Connector {
    fn drop(&mut self) {
        if self.pool.get_mut().connected && !self.disconnect() {
            warn!("connector dropped while still connected");
        }
    }
}
