//! Blocking, fixed-size connection pooling for SQL databases.
//!
//! A [`Connector`] owns a fixed number of physical connections to one backend
//! (SQLite through `rusqlite`, PostgreSQL through `tokio-postgres`, or any
//! [`Backend`] implementation). Work happens inside a [`Transaction`], which
//! holds one of those connections exclusively from creation until it is
//! committed, rolled back, or dropped. Parameters and result columns are carried
//! as the dynamically typed [`Variant`].
//!
//! ```rust,no_run
//! # #[cfg(feature = "sqlite")]
//! # fn demo() -> Result<(), sql_connector::SqlConnectorError> {
//! use sql_connector::prelude::*;
//!
//! let connector = Connector::new_sqlite("file:demo?mode=memory&cache=shared", 2)?;
//! connector.connect()?;
//!
//! let mut tx = Transaction::new(&connector, TransactionMode::AutoBegin)?;
//! tx.exec("CREATE TABLE city (id INTEGER, name TEXT)", &[])?;
//! tx.exec("INSERT INTO city VALUES (?1, ?2)", &[1.into(), "Omsk".into()])?;
//! let cities = tx.query("SELECT id, name FROM city", &[])?;
//! assert_eq!(cities.results[0].get_as::<&str>("name")?, "Omsk");
//! tx.commit()?;
//!
//! assert!(connector.disconnect());
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod connector;
pub mod error;
pub mod prelude;
pub mod results;
pub mod statement;
pub mod transaction;
pub mod translation;
pub mod types;
pub mod value;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use backend::{Backend, BackendConnection};
pub use config::ConnectorConfig;
pub use connector::{
    Connector, HandleId, MAX_POOL_SIZE, PoolStatus, clear_default_connector, default_connector,
    set_default_connector,
};
pub use error::SqlConnectorError;
pub use results::{ResultSet, Row};
pub use statement::{Statement, StatementType};
pub use transaction::{Transaction, TransactionId, TransactionMode};
pub use translation::translate_placeholders;
pub use types::{DatabaseType, SqlSyntax};
pub use value::{Buffer, DateTime, FromVariant, Object, ObjectRef, Variant, VariantType};

#[cfg(feature = "postgres")]
pub use postgres::PgBackend;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;
