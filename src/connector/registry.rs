use std::sync::Arc;

use parking_lot::{RwLock, const_rwlock};
use tracing::debug;

use super::Connector;

static DEFAULT_CONNECTOR: RwLock<Option<Arc<Connector>>> = const_rwlock(None);

/// Install the process-wide connector used by
/// [`Transaction::with_default_connector`](crate::Transaction::with_default_connector).
/// Passing `None` clears it.
pub fn set_default_connector(connector: Option<Arc<Connector>>) {
    debug!(set = connector.is_some(), "default connector updated");
    *DEFAULT_CONNECTOR.write() = connector;
}

/// The process-wide default connector, if one is installed.
#[must_use]
pub fn default_connector() -> Option<Arc<Connector>> {
    DEFAULT_CONNECTOR.read().clone()
}

/// Remove the default connector, returning it so the caller can disconnect it.
pub fn clear_default_connector() -> Option<Arc<Connector>> {
    DEFAULT_CONNECTOR.write().take()
}
