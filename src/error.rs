use std::time::Duration;

use thiserror::Error;

use crate::value::VariantType;

#[derive(Debug, Error)]
pub enum SqlConnectorError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Misuse of a transaction or statement (double begin, use after commit, ...).
    #[error("Transaction state error: {0}")]
    StateError(String),

    #[error("Variant of type {from} is not convertible to {target}")]
    InvalidConversion {
        from: VariantType,
        target: &'static str,
    },

    #[error("Conversion error: {0}")]
    ConversionError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Timed out after {0:?} waiting for a free connection")]
    PoolTimeout(Duration),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl SqlConnectorError {
    pub(crate) fn state(msg: impl Into<String>) -> Self {
        SqlConnectorError::StateError(msg.into())
    }
}
