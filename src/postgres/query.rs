use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tokio_postgres::Statement;

use crate::error::SqlConnectorError;
use crate::results::ResultSet;
use crate::value::{DateTime, Variant};

/// Build a result set from rows of a prepared statement, taking the column
/// names from the statement metadata.
///
/// # Errors
/// Returns errors from row value extraction.
pub fn build_result_set(
    stmt: &Statement,
    rows: &[tokio_postgres::Row],
) -> Result<ResultSet, SqlConnectorError> {
    let column_names: Vec<String> = stmt
        .columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect();
    let column_count = column_names.len();

    let mut result_set = ResultSet::with_capacity(rows.len());
    result_set.set_column_names(Arc::new(column_names));

    for row in rows {
        let mut row_values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            row_values.push(postgres_extract_value(row, idx)?);
        }
        result_set.add_row_values(row_values)?;
    }

    Ok(result_set)
}

/// Extracts a [`Variant`] from a `tokio_postgres` row, choosing the Rust type by
/// the column's type name. SQL NULL becomes a void variant.
///
/// # Errors
/// Returns `SqlConnectorError` if the column cannot be retrieved.
pub fn postgres_extract_value(
    row: &tokio_postgres::Row,
    idx: usize,
) -> Result<Variant, SqlConnectorError> {
    let type_info = row.columns()[idx].type_();

    let value = match type_info.name() {
        "bool" => row.try_get::<_, Option<bool>>(idx)?.into(),
        "int2" => row
            .try_get::<_, Option<i16>>(idx)?
            .map(i32::from)
            .into(),
        "int4" => row.try_get::<_, Option<i32>>(idx)?.into(),
        "int8" => row.try_get::<_, Option<i64>>(idx)?.into(),
        "oid" => row.try_get::<_, Option<u32>>(idx)?.into(),
        "float4" => row.try_get::<_, Option<f32>>(idx)?.into(),
        "float8" => row.try_get::<_, Option<f64>>(idx)?.into(),
        "timestamp" => row
            .try_get::<_, Option<NaiveDateTime>>(idx)?
            .map(DateTime::from)
            .into(),
        "timestamptz" => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)?
            .map(|ts| DateTime::from(ts.naive_utc()))
            .into(),
        "date" => row
            .try_get::<_, Option<NaiveDate>>(idx)?
            .map(|d| DateTime::from(d.and_time(chrono::NaiveTime::MIN)))
            .into(),
        // text, varchar, bpchar, name and anything else that decodes as text
        _ => row.try_get::<_, Option<String>>(idx)?.into(),
    };
    Ok(value)
}
