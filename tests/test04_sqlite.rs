#![cfg(feature = "sqlite")]

use sql_connector::{
    Connector, ConnectorConfig, DatabaseType, DateTime, SqlConnectorError, StatementType,
    TransactionMode, Variant, VariantType,
};
use tempfile::tempdir;

fn count(tx: &mut sql_connector::Transaction) -> Result<i64, SqlConnectorError> {
    let rs = tx.query("SELECT COUNT(*) AS cnt FROM city", &[])?;
    rs.results[0].get_as::<i64>("cnt")
}

#[test]
fn file_database_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("cities.db");
    let connector = Connector::new_sqlite(path.to_string_lossy(), 3)?;
    connector.connect()?;

    let mut tx = connector.create_transaction(TransactionMode::AutoBegin)?;
    tx.exec(
        "CREATE TABLE city (id INTEGER PRIMARY KEY, name TEXT, area REAL, founded TEXT, capital INTEGER)",
        &[],
    )?;
    let founded = DateTime::from_iso_string("1716-05-20 00:00:00")?;
    let inserted = tx.exec(
        "INSERT INTO city VALUES (?1, ?2, ?3, ?4, ?5)",
        &[
            Variant::from(1_i32),
            Variant::from("Omsk"),
            Variant::from(566.9_f64),
            Variant::from(founded),
            Variant::from(false),
        ],
    )?;
    assert_eq!(inserted.rows_affected, 1);
    tx.exec(
        "INSERT INTO city (id, name) VALUES (?1, ?2)",
        &[Variant::from(2_u32), Variant::from("Tara")],
    )?;
    tx.commit()?;

    let mut tx = connector.create_transaction(TransactionMode::AutoBegin)?;
    let rs = tx.query(
        "SELECT id, name, area, founded, capital FROM city ORDER BY id",
        &[],
    )?;
    assert_eq!(rs.len(), 2);
    let names = rs.get_column_names().expect("columns");
    assert_eq!(names.as_slice(), ["id", "name", "area", "founded", "capital"]);

    let omsk = &rs.results[0];
    assert_eq!(omsk.get("id").unwrap().variant_type(), VariantType::Int64);
    assert_eq!(omsk.get_as::<i32>("id")?, 1);
    assert_eq!(omsk.get_as::<&str>("name")?, "Omsk");
    assert!((omsk.get_as::<f64>("area")? - 566.9).abs() < 1e-9);
    assert_eq!(omsk.get_as::<DateTime>("founded")?, founded);
    assert!(!omsk.get_as::<bool>("capital")?);

    let tara = &rs.results[1];
    assert!(!tara.get("area").unwrap().valid());
    assert!(!tara.get("founded").unwrap().valid());
    tx.commit()?;

    assert!(connector.disconnect());
    Ok(())
}

#[test]
fn rollback_and_drop_discard_changes() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("rollback.db");
    let connector = Connector::new_sqlite(path.to_string_lossy(), 2)?;
    connector.connect()?;

    let mut tx = connector.create_transaction(TransactionMode::AutoBegin)?;
    tx.exec("CREATE TABLE city (id INTEGER, name TEXT)", &[])?;
    tx.commit()?;

    let mut tx = connector.create_transaction(TransactionMode::AutoBegin)?;
    tx.exec("INSERT INTO city VALUES (1, 'Omsk')", &[])?;
    tx.rollback()?;

    {
        let mut tx = connector.create_transaction(TransactionMode::AutoBegin)?;
        tx.exec("INSERT INTO city VALUES (2, 'Tara')", &[])?;
    }

    let mut tx = connector.create_transaction(TransactionMode::AutoBegin)?;
    assert_eq!(count(&mut tx)?, 0);
    tx.exec("INSERT INTO city VALUES (3, 'Tobolsk')", &[])?;
    tx.commit()?;

    let mut tx = connector.create_transaction(TransactionMode::AutoBegin)?;
    assert_eq!(count(&mut tx)?, 1);
    tx.commit()?;
    Ok(())
}

#[test]
fn shared_memory_database_spans_handles() -> Result<(), SqlConnectorError> {
    let connector = Connector::new_sqlite("file:shared_spans_handles?mode=memory&cache=shared", 2)?;
    connector.connect()?;

    let mut reader = connector.create_transaction(TransactionMode::Manual)?;

    let mut writer = connector.create_transaction(TransactionMode::AutoBegin)?;
    writer.exec("CREATE TABLE city (id INTEGER, name TEXT)", &[])?;
    writer.exec("INSERT INTO city VALUES (1, 'Omsk')", &[])?;
    writer.commit()?;

    reader.begin()?;
    assert_eq!(count(&mut reader)?, 1);
    reader.commit()?;
    Ok(())
}

#[test]
fn statement_errors_surface() -> Result<(), SqlConnectorError> {
    let connector = Connector::new_sqlite(":memory:", 1)?;
    connector.connect()?;
    let mut tx = connector.create_transaction(TransactionMode::AutoBegin)?;

    assert!(matches!(
        tx.exec("SELECT ?1, ?2", &[Variant::from(1)]),
        Err(SqlConnectorError::ParameterError(_))
    ));
    assert!(matches!(
        tx.query("SELECT x'00'", &[]),
        Err(SqlConnectorError::ExecutionError(_))
    ));
    assert!(matches!(
        tx.exec("SELECT ?1", &[Variant::from(vec![Variant::from(1)])]),
        Err(SqlConnectorError::SqliteError(_))
    ));
    assert!(matches!(
        tx.exec("NOT SQL AT ALL", &[]),
        Err(SqlConnectorError::SqliteError(_))
    ));

    let mut stmt = tx.statement(StatementType::Select, "SELECT 1 AS one")?;
    assert!(!stmt.prepared());
    let rs = tx.execute(&mut stmt, &[])?;
    assert!(stmt.prepared() && stmt.done());
    assert_eq!(rs.results[0].get_as::<i32>("one")?, 1);
    tx.commit()?;
    Ok(())
}

#[test]
fn configured_connector_translates_placeholders() -> Result<(), SqlConnectorError> {
    let config = ConnectorConfig::new(
        DatabaseType::Sqlite,
        "file:translated_placeholders?mode=memory&cache=shared",
    )
    .with_pool_size(1)
    .with_translation(true);
    let connector = Connector::from_config(&config)?;
    connector.connect()?;

    let mut tx = connector.create_transaction(TransactionMode::AutoBegin)?;
    let stmt = tx.statement(StatementType::Select, "SELECT $1 + $2 AS total")?;
    assert_eq!(stmt.query_text(), "SELECT ?1 + ?2 AS total");
    let rs = tx.query("SELECT $1 + $2 AS total", &[Variant::from(2), Variant::from(3)])?;
    assert_eq!(rs.results[0].get_as::<i64>("total")?, 5);
    tx.commit()?;
    Ok(())
}
