use std::sync::Arc;

use serde::Deserialize;

use crate::backend::Backend;
use crate::connector::Connector;
use crate::error::SqlConnectorError;
use crate::types::DatabaseType;

fn default_pool_size() -> usize {
    4
}

/// Everything needed to build a [`Connector`], loadable from JSON.
///
/// ```rust
/// # #[cfg(feature = "sqlite")]
/// # fn demo() -> Result<(), sql_connector::SqlConnectorError> {
/// use sql_connector::ConnectorConfig;
///
/// let config = ConnectorConfig::from_json(
///     r#"{ "database_type": "sqlite", "connection_string": ":memory:" }"#,
/// )?;
/// assert_eq!(config.pool_size, 4);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectorConfig {
    pub database_type: DatabaseType,
    /// A path or URI for SQLite, a libpq-style or URL string for PostgreSQL.
    pub connection_string: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// Rewrite `$N`/`?N` placeholders into the backend's dialect.
    #[serde(default)]
    pub translate_placeholders: bool,
}

impl ConnectorConfig {
    #[must_use]
    pub fn new(database_type: DatabaseType, connection_string: impl Into<String>) -> Self {
        Self {
            database_type,
            connection_string: connection_string.into(),
            pool_size: default_pool_size(),
            translate_placeholders: false,
        }
    }

    #[must_use]
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    #[must_use]
    pub fn with_translation(mut self, translate_placeholders: bool) -> Self {
        self.translate_placeholders = translate_placeholders;
        self
    }

    /// # Errors
    /// Returns `SqlConnectorError::ConfigError` if `json` is not a valid config.
    pub fn from_json(json: &str) -> Result<Self, SqlConnectorError> {
        serde_json::from_str(json)
            .map_err(|e| SqlConnectorError::ConfigError(format!("invalid connector config: {e}")))
    }
}

impl Connector {
    /// Build a disconnected connector for the configured backend.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ConfigError` if the connection string or pool
    /// size is invalid.
    pub fn from_config(config: &ConnectorConfig) -> Result<Arc<Connector>, SqlConnectorError> {
        let backend: Box<dyn Backend> = match config.database_type {
            #[cfg(feature = "sqlite")]
            DatabaseType::Sqlite => Box::new(crate::sqlite::SqliteBackend::new(
                config.connection_string.clone(),
            )),
            #[cfg(feature = "postgres")]
            DatabaseType::Postgres => Box::new(crate::postgres::PgBackend::from_conn_str(
                &config.connection_string,
            )?),
        };
        Connector::with_options(backend, config.pool_size, config.translate_placeholders)
    }
}
