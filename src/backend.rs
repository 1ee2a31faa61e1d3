//! The seam between the pool and database drivers.
//!
//! A [`Backend`] knows how to open one physical connection; the
//! [`Connector`](crate::Connector) calls it `pool_size` times at connect time and
//! hands the resulting [`BackendConnection`]s out one transaction at a time.

use std::fmt;

use crate::error::SqlConnectorError;
use crate::results::ResultSet;
use crate::statement::Statement;
use crate::types::SqlSyntax;
use crate::value::Variant;

/// Driver for one kind of database.
pub trait Backend: Send + Sync + fmt::Debug {
    /// Dialect reported by [`Connector::sql_syntax`](crate::Connector::sql_syntax).
    fn sql_syntax(&self) -> SqlSyntax;

    /// Open a new physical connection.
    ///
    /// # Errors
    /// Returns `SqlConnectorError` if the connection could not be established.
    fn open(&self) -> Result<Box<dyn BackendConnection>, SqlConnectorError>;
}

/// One open physical connection. Only ever used by a single transaction at a time.
pub trait BackendConnection: Send {
    /// # Errors
    /// Returns `SqlConnectorError` if the backend rejects `BEGIN`.
    fn begin(&mut self) -> Result<(), SqlConnectorError>;

    /// # Errors
    /// Returns `SqlConnectorError` if the backend rejects `COMMIT`.
    fn commit(&mut self) -> Result<(), SqlConnectorError>;

    /// # Errors
    /// Returns `SqlConnectorError` if the backend rejects `ROLLBACK`.
    fn rollback(&mut self) -> Result<(), SqlConnectorError>;

    /// Run `statement` to completion with `params` bound in order.
    ///
    /// Implementations prepare the text only if this connection has no plan for
    /// it yet (a statement with `prepared()` set always has one), then mark it
    /// prepared, collect every row, and mark it done.
    ///
    /// # Errors
    /// Returns `SqlConnectorError` if preparing, binding, executing or decoding fails.
    fn execute(
        &mut self,
        statement: &mut Statement,
        params: &[Variant],
    ) -> Result<ResultSet, SqlConnectorError>;

    /// Close the connection. Dropping it must be equivalent.
    fn close(self: Box<Self>) {}
}
