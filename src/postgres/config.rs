use std::sync::Arc;

use super::PgBackend;
use crate::connector::Connector;
use crate::error::SqlConnectorError;

impl Connector {
    /// Disconnected connector over `pool_size` PostgreSQL clients.
    ///
    /// `conn_str` is parsed immediately; nothing is dialed until
    /// [`Connector::connect`].
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ConfigError` if `conn_str` does not parse or
    /// `pool_size` is outside `1..=10`.
    pub fn new_postgres(
        conn_str: &str,
        pool_size: usize,
    ) -> Result<Arc<Connector>, SqlConnectorError> {
        Connector::new(Box::new(PgBackend::from_conn_str(conn_str)?), pool_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SqlSyntax;

    #[test]
    fn parses_eagerly() {
        let connector =
            Connector::new_postgres("host=localhost user=postgres dbname=app", 2).unwrap();
        assert_eq!(connector.sql_syntax(), SqlSyntax::PostgreSql);
        assert!(!connector.is_connected());

        assert!(matches!(
            Connector::new_postgres("host=localhost port=notaport", 2),
            Err(SqlConnectorError::ConfigError(_))
        ));
    }
}
