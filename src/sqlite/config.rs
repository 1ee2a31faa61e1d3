use std::sync::Arc;

use super::SqliteBackend;
use crate::connector::Connector;
use crate::error::SqlConnectorError;

impl Connector {
    /// Disconnected connector over `pool_size` SQLite connections to `db_path`.
    ///
    /// `db_path` may be a file path, `:memory:` (each handle gets a private
    /// database), or a URI such as `file:shared?mode=memory&cache=shared`.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ConfigError` if `pool_size` is outside `1..=10`.
    pub fn new_sqlite(
        db_path: impl Into<String>,
        pool_size: usize,
    ) -> Result<Arc<Connector>, SqlConnectorError> {
        Connector::new(Box::new(SqliteBackend::new(db_path)), pool_size)
    }
}
