mod common;

use common::{MockBackend, MockStats};
use sql_connector::{
    Connector, SqlConnectorError, SqlSyntax, StatementType, Transaction, TransactionMode, Variant,
};

fn is_state_error<T>(res: Result<T, SqlConnectorError>) -> bool {
    matches!(res, Err(SqlConnectorError::StateError(_)))
}

#[test]
fn lifecycle_is_enforced() -> Result<(), SqlConnectorError> {
    let (backend, stats) = MockBackend::new();
    let connector = Connector::new(Box::new(backend), 1)?;
    connector.connect()?;

    let mut tx = Transaction::new(&connector, TransactionMode::Manual)?;
    assert!(!tx.is_active());
    assert!(is_state_error(tx.exec("SELECT 1", &[])));
    assert!(is_state_error(tx.commit()));

    tx.begin()?;
    assert!(tx.is_active());
    assert!(is_state_error(tx.begin()));
    assert_eq!(MockStats::get(&stats.begins), 1);

    tx.exec("UPDATE t SET a = 1", &[])?;
    tx.commit()?;
    assert!(tx.is_finalized());
    assert_eq!(connector.status().free, 1);

    assert!(is_state_error(tx.commit()));
    assert!(is_state_error(tx.rollback()));
    assert!(is_state_error(tx.begin()));
    assert!(is_state_error(tx.statement(StatementType::Select, "SELECT 1")));
    assert!(is_state_error(tx.exec("SELECT 1", &[])));
    assert_eq!(MockStats::get(&stats.commits), 1);
    assert_eq!(MockStats::get(&stats.rollbacks), 0);
    Ok(())
}

#[test]
fn auto_begin_issues_begin() -> Result<(), SqlConnectorError> {
    let (backend, stats) = MockBackend::new();
    let connector = Connector::new(Box::new(backend), 1)?;
    connector.connect()?;

    let mut tx = connector.create_transaction(TransactionMode::AutoBegin)?;
    assert!(tx.is_active());
    assert_eq!(MockStats::get(&stats.begins), 1);
    tx.rollback()?;
    assert!(is_state_error(tx.commit()));
    assert_eq!(MockStats::get(&stats.rollbacks), 1);
    Ok(())
}

#[test]
fn failed_commit_rolls_back_and_returns_the_handle() -> Result<(), SqlConnectorError> {
    let (mut backend, stats) = MockBackend::new();
    backend.fail_commit = true;
    let connector = Connector::new(Box::new(backend), 1)?;
    connector.connect()?;

    let mut tx = connector.create_transaction(TransactionMode::AutoBegin)?;
    assert!(matches!(
        tx.commit(),
        Err(SqlConnectorError::ExecutionError(_))
    ));
    assert!(tx.is_finalized());
    assert_eq!(MockStats::get(&stats.rollbacks), 1);
    let status = connector.status();
    assert_eq!((status.free, status.used, status.transactions), (1, 0, 0));
    assert!(is_state_error(tx.commit()));
    Ok(())
}

#[test]
fn drop_rolls_back_an_active_transaction() -> Result<(), SqlConnectorError> {
    let (backend, stats) = MockBackend::new();
    let connector = Connector::new(Box::new(backend), 1)?;
    connector.connect()?;

    {
        let mut tx = connector.create_transaction(TransactionMode::AutoBegin)?;
        tx.exec("INSERT INTO t VALUES (1)", &[])?;
    }
    assert_eq!(MockStats::get(&stats.rollbacks), 1);
    assert_eq!(connector.status().free, 1);

    // Never begun: nothing to roll back, but the handle still comes back.
    drop(connector.create_transaction(TransactionMode::Manual)?);
    assert_eq!(MockStats::get(&stats.rollbacks), 1);
    assert_eq!(connector.status().free, 1);
    assert!(connector.disconnect());
    Ok(())
}

#[test]
fn close_transaction_rolls_back_and_finalizes() -> Result<(), SqlConnectorError> {
    let (backend, stats) = MockBackend::new();
    let connector = Connector::new(Box::new(backend), 1)?;
    connector.connect()?;

    let mut tx = connector.create_transaction(TransactionMode::AutoBegin)?;
    assert!(connector.close_transaction(&mut tx));
    assert_eq!(MockStats::get(&stats.rollbacks), 1);
    assert!(tx.is_finalized());
    assert!(is_state_error(tx.commit()));
    assert!(!connector.close_transaction(&mut tx));
    Ok(())
}

#[test]
fn statements_stay_with_their_connection() -> Result<(), SqlConnectorError> {
    let (backend, _stats) = MockBackend::new();
    let connector = Connector::new(Box::new(backend), 2)?;
    connector.connect()?;

    let mut a = connector.create_transaction(TransactionMode::AutoBegin)?;
    let mut b = connector.create_transaction(TransactionMode::AutoBegin)?;

    let mut stmt = a.statement(StatementType::Update, "UPDATE t SET a = ?1")?;
    assert_eq!(stmt.handle(), a.statement(StatementType::Select, "SELECT 1")?.handle());
    assert!(is_state_error(b.execute(&mut stmt, &[Variant::from(1)])));
    assert!(!stmt.prepared());

    let rs = a.execute(&mut stmt, &[Variant::from(1)])?;
    assert_eq!(rs.rows_affected, 1);
    assert!(stmt.prepared() && stmt.done());
    assert!(is_state_error(a.execute(&mut stmt, &[Variant::from(1)])));
    assert!(stmt.set_done(false).is_err());

    a.commit()?;
    b.commit()?;
    Ok(())
}

#[test]
fn statements_do_not_cross_connectors() -> Result<(), SqlConnectorError> {
    let (backend_a, stats_a) = MockBackend::new();
    let (backend_b, stats_b) = MockBackend::new();
    let connector_a = Connector::new(Box::new(backend_a), 1)?;
    let connector_b = Connector::new(Box::new(backend_b), 1)?;
    connector_a.connect()?;
    connector_b.connect()?;

    let mut tx_a = connector_a.create_transaction(TransactionMode::AutoBegin)?;
    let mut tx_b = connector_b.create_transaction(TransactionMode::AutoBegin)?;

    let mut stmt = tx_a.statement(StatementType::Select, "SELECT from_a")?;
    assert_ne!(stmt.handle(), tx_b.statement(StatementType::Select, "SELECT 1")?.handle());
    assert!(is_state_error(tx_b.execute(&mut stmt, &[])));
    assert!(stats_b.executed.lock().is_empty());
    assert!(!stmt.prepared());

    tx_a.execute(&mut stmt, &[])?;
    assert_eq!(*stats_a.executed.lock(), vec!["SELECT from_a".to_string()]);

    tx_a.commit()?;
    tx_b.commit()?;
    Ok(())
}

#[test]
fn placeholders_follow_the_backend_dialect() -> Result<(), SqlConnectorError> {
    let (mut backend, stats) = MockBackend::new();
    backend.syntax = SqlSyntax::PostgreSql;
    let connector = Connector::with_options(Box::new(backend), 1, true)?;
    connector.connect()?;
    assert_eq!(connector.sql_syntax(), SqlSyntax::PostgreSql);

    let mut tx = connector.create_transaction(TransactionMode::AutoBegin)?;
    let stmt = tx.statement(StatementType::Select, "SELECT a FROM t WHERE b = ?1")?;
    assert_eq!(stmt.query_text(), "SELECT a FROM t WHERE b = $1");
    tx.exec("DELETE FROM t WHERE b = ?1 AND c = '?2'", &[Variant::from(3)])?;
    tx.commit()?;

    assert_eq!(
        stats.executed.lock().as_slice(),
        ["DELETE FROM t WHERE b = $1 AND c = '?2'"]
    );
    Ok(())
}
