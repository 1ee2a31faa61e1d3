use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// The database type supported by this connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// `PostgreSQL` database
    #[cfg(feature = "postgres")]
    Postgres,
    /// `SQLite` database
    #[cfg(feature = "sqlite")]
    Sqlite,
}

/// SQL dialect spoken by a connector's backend.
///
/// Statement producers use this to pick dialect quirks such as placeholder
/// style; it has no effect on the pool itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SqlSyntax {
    #[default]
    Unknown,
    Sqlite,
    PostgreSql,
    MySql,
}
