//! Convenient imports for common functionality.

pub use crate::backend::{Backend, BackendConnection};
pub use crate::config::ConnectorConfig;
pub use crate::connector::{Connector, PoolStatus, default_connector, set_default_connector};
pub use crate::error::SqlConnectorError;
pub use crate::results::{ResultSet, Row};
pub use crate::statement::{Statement, StatementType};
pub use crate::transaction::{Transaction, TransactionMode};
pub use crate::types::{DatabaseType, SqlSyntax};
pub use crate::value::{DateTime, FromVariant, Object, ObjectRef, Variant, VariantType};
