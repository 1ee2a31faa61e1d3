use std::sync::Arc;

use rusqlite::Statement;
use rusqlite::types::ValueRef;

use crate::error::SqlConnectorError;
use crate::results::ResultSet;
use crate::value::Variant;

/// Convert one SQLite column value into a [`Variant`].
///
/// # Errors
/// Returns `SqlConnectorError::ExecutionError` for BLOB columns and
/// `SqlConnectorError::ConversionError` for TEXT that is not valid UTF-8.
pub fn sqlite_extract_value(row: &rusqlite::Row, idx: usize) -> Result<Variant, SqlConnectorError> {
    match row.get_ref(idx)? {
        ValueRef::Null => Ok(Variant::void()),
        ValueRef::Integer(i) => Ok(Variant::from(i)),
        ValueRef::Real(f) => Ok(Variant::from(f)),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(Variant::from)
            .map_err(|e| SqlConnectorError::ConversionError(format!("column {idx}: {e}"))),
        ValueRef::Blob(_) => Err(SqlConnectorError::ExecutionError(format!(
            "column {idx} holds a BLOB, which has no variant representation"
        ))),
    }
}

/// Run a prepared statement and collect its output.
///
/// Statements without result columns report the number of changed rows;
/// queries collect every row and report the row count.
///
/// # Errors
/// Returns `SqlConnectorError` if binding, stepping or decoding fails.
pub fn build_result_set(
    stmt: &mut Statement,
    params: &[Variant],
) -> Result<ResultSet, SqlConnectorError> {
    if stmt.column_count() == 0 {
        let changed = stmt.execute(rusqlite::params_from_iter(params.iter()))?;
        return Ok(ResultSet::affected(changed));
    }

    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let col_count = column_names.len();

    let mut result_set = ResultSet::with_capacity(10);
    result_set.set_column_names(Arc::new(column_names));

    let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
    while let Some(row) = rows.next()? {
        let mut row_values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            row_values.push(sqlite_extract_value(row, i)?);
        }
        result_set.add_row_values(row_values)?;
    }

    Ok(result_set)
}
