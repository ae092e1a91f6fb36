//! Immutable per-table schemas

use crate::{Column, ColumnType, PATIENT_ID_COLUMN};
use cohortsql_diagnostics::{ExtractError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// An ordered mapping of column name to column declaration
///
/// Built once per backend/table at startup and used only for lookup; never
/// mutated after construction. Column order is declaration order and is
/// preserved through `column_names`/`column_types` so downstream code
/// generation is deterministic.
///
/// The implicit `patient_id` integer column is always present and always
/// first; constructors insert it when the caller did not declare it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name as known to the backend
    name: String,
    columns: IndexMap<String, Column>,
}

impl TableSchema {
    /// Build a schema from (name, primitive type) pairs
    pub fn from_primitives<N, I>(name: impl Into<String>, columns: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, ColumnType)>,
    {
        Self::from_columns(
            name,
            columns
                .into_iter()
                .map(|(n, t)| (n, Column::new(t)))
                .collect::<Vec<_>>(),
        )
    }

    /// Build a schema from full column declarations (including categories)
    pub fn from_columns<N, I>(name: impl Into<String>, columns: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Column)>,
    {
        let mut map = IndexMap::new();
        map.insert(
            PATIENT_ID_COLUMN.to_string(),
            Column::new(ColumnType::Integer),
        );
        for (n, c) in columns {
            map.insert(n.into(), c);
        }
        Self {
            name: name.into(),
            columns: map,
        }
    }

    /// The table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a column declaration
    pub fn get_column(&self, column: &str) -> Result<&Column> {
        self.columns
            .get(column)
            .ok_or_else(|| ExtractError::unknown_column(&self.name, column))
    }

    /// Look up a column's type
    pub fn get_column_type(&self, column: &str) -> Result<ColumnType> {
        self.get_column(column).map(|c| c.column_type)
    }

    /// Look up a column's declared categories, if any
    pub fn get_column_categories(&self, column: &str) -> Result<Option<&[String]>> {
        self.get_column(column)
            .map(|c| c.categories.as_deref())
    }

    /// Check whether a column is declared
    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Column names in declaration order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// (name, type) pairs in declaration order
    pub fn column_types(&self) -> impl Iterator<Item = (&str, ColumnType)> {
        self.columns.iter().map(|(n, c)| (n.as_str(), c.column_type))
    }

    /// Full (name, column) pairs in declaration order
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(n, c)| (n.as_str(), c))
    }

    /// Number of declared columns, including `patient_id`
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when only the implicit `patient_id` column is present
    pub fn is_empty(&self) -> bool {
        self.columns.len() <= 1
    }
}

// Structural, order-sensitive equality: schemas built from the same
// primitives in the same order are interchangeable.
impl PartialEq for TableSchema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.columns.iter().eq(other.columns.iter())
    }
}

impl Eq for TableSchema {}

impl Hash for TableSchema {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        for (name, column) in &self.columns {
            name.hash(state);
            column.hash(state);
        }
    }
}
