use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SqlConnectorError;
use crate::value::{FromVariant, Variant};

/// A row from a query result, holding one [`Variant`] per column.
#[derive(Debug, Clone)]
pub struct Row {
    /// The column names for this row (shared across all rows in a result set)
    pub column_names: Arc<Vec<String>>,
    /// The values for this row
    pub values: Vec<Variant>,
    column_index: Arc<HashMap<String, usize>>,
}

impl Row {
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<Variant>) -> Self {
        let column_index = Arc::new(index_columns(&column_names));
        Self {
            column_names,
            values,
            column_index,
        }
    }

    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.column_index.get(column_name).copied()
    }

    /// Get a value from the row by column name
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&Variant> {
        self.get_column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&Variant> {
        self.values.get(index)
    }

    /// Convert the named column with [`Variant::value`].
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ExecutionError` if the column does not exist, or
    /// the conversion error if the value cannot become `T`.
    pub fn get_as<'a, T: FromVariant<'a>>(
        &'a self,
        column_name: &str,
    ) -> Result<T, SqlConnectorError> {
        self.get(column_name)
            .ok_or_else(|| {
                SqlConnectorError::ExecutionError(format!("no column named '{column_name}'"))
            })?
            .value::<T>()
    }
}

fn index_columns(column_names: &[String]) -> HashMap<String, usize> {
    column_names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect()
}

/// A result set from a database query
///
/// Holds every row produced by one statement execution plus the number of rows
/// affected (for DML) or returned (for queries).
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query
    pub results: Vec<Row>,
    /// The number of rows affected (for DML statements)
    pub rows_affected: usize,
    column_names: Option<Arc<Vec<String>>>,
    column_index: Option<Arc<HashMap<String, usize>>>,
}

impl ResultSet {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            results: Vec::with_capacity(capacity),
            ..ResultSet::default()
        }
    }

    /// Result of a statement that returns no rows.
    #[must_use]
    pub fn affected(rows_affected: usize) -> ResultSet {
        ResultSet {
            rows_affected,
            ..ResultSet::default()
        }
    }

    /// Set the column names for this result set (to be shared by all rows)
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.column_index = Some(Arc::new(index_columns(&column_names)));
        self.column_names = Some(column_names);
    }

    #[must_use]
    pub fn get_column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Append a row using the result set's column names.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ExecutionError` if no column names were set or
    /// the value count does not match them.
    pub fn add_row_values(&mut self, values: Vec<Variant>) -> Result<(), SqlConnectorError> {
        let (Some(column_names), Some(column_index)) = (&self.column_names, &self.column_index)
        else {
            return Err(SqlConnectorError::ExecutionError(
                "No column names available".to_string(),
            ));
        };
        if values.len() != column_names.len() {
            return Err(SqlConnectorError::ExecutionError(format!(
                "row has {} values but the result has {} columns",
                values.len(),
                column_names.len()
            )));
        }
        self.results.push(Row {
            column_names: Arc::clone(column_names),
            values,
            column_index: Arc::clone(column_index),
        });
        self.rows_affected += 1;
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.results.iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

impl IntoIterator for ResultSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}
