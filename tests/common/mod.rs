#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use sql_connector::{
    Backend, BackendConnection, ResultSet, SqlConnectorError, SqlSyntax, Statement, Variant,
};

/// Shared counters for everything a [`MockBackend`] and its connections do.
#[derive(Debug, Default)]
pub struct MockStats {
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub begins: AtomicUsize,
    pub commits: AtomicUsize,
    pub rollbacks: AtomicUsize,
    pub executed: Mutex<Vec<String>>,
}

impl MockStats {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// In-process backend that records calls instead of talking to a database.
#[derive(Debug, Default)]
pub struct MockBackend {
    pub stats: Arc<MockStats>,
    /// Fail the open with this 1-based ordinal.
    pub fail_open_at: Option<usize>,
    pub fail_commit: bool,
    pub syntax: SqlSyntax,
}

impl MockBackend {
    pub fn new() -> (Self, Arc<MockStats>) {
        let backend = MockBackend::default();
        let stats = Arc::clone(&backend.stats);
        (backend, stats)
    }
}

impl Backend for MockBackend {
    fn sql_syntax(&self) -> SqlSyntax {
        self.syntax
    }

    fn open(&self) -> Result<Box<dyn BackendConnection>, SqlConnectorError> {
        let nth = self.stats.opens.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_open_at == Some(nth) {
            return Err(SqlConnectorError::ConnectionError(format!(
                "mock open #{nth} refused"
            )));
        }
        Ok(Box::new(MockConnection {
            stats: Arc::clone(&self.stats),
            fail_commit: self.fail_commit,
        }))
    }
}

pub struct MockConnection {
    stats: Arc<MockStats>,
    fail_commit: bool,
}

impl BackendConnection for MockConnection {
    fn begin(&mut self) -> Result<(), SqlConnectorError> {
        self.stats.begins.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SqlConnectorError> {
        if self.fail_commit {
            return Err(SqlConnectorError::ExecutionError(
                "mock commit refused".to_string(),
            ));
        }
        self.stats.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), SqlConnectorError> {
        self.stats.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn execute(
        &mut self,
        statement: &mut Statement,
        params: &[Variant],
    ) -> Result<ResultSet, SqlConnectorError> {
        statement.set_prepared(true)?;
        self.stats
            .executed
            .lock()
            .push(statement.query_text().to_string());
        statement.set_done(true)?;
        Ok(ResultSet::affected(params.len()))
    }

    fn close(self: Box<Self>) {
        self.stats.closes.fetch_add(1, Ordering::SeqCst);
    }
}
