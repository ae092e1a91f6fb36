//! Backend descriptors and the query-runner seam

use async_trait::async_trait;
use cohortsql_diagnostics::{ExtractError, Result};
use cohortsql_dialect::resolve_driver;
use cohortsql_types::{TableSchema, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Connection parameters for a backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSpec {
    /// Connection URL; the scheme is the logical backend name
    pub url: String,
}

impl ConnectionSpec {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Everything the engine needs to know about a backend: its logical name,
/// connection parameters, and a schema per table it exposes
#[derive(Debug, Clone)]
pub struct BackendDescriptor {
    name: String,
    connection: ConnectionSpec,
    tables: IndexMap<String, TableSchema>,
}

impl BackendDescriptor {
    /// Create a descriptor for a logical backend name
    pub fn new(
        name: impl Into<String>,
        connection: ConnectionSpec,
        tables: impl IntoIterator<Item = TableSchema>,
    ) -> Self {
        Self {
            name: name.into(),
            connection,
            tables: tables
                .into_iter()
                .map(|s| (s.name().to_string(), s))
                .collect(),
        }
    }

    /// The logical backend name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a table's schema
    pub fn table_schema(&self, table: &str) -> Result<&TableSchema> {
        self.tables
            .get(table)
            .ok_or_else(|| ExtractError::unknown_table(table))
    }

    /// Exposed tables in declaration order
    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values()
    }

    /// The connection URL with the logical scheme replaced by the driver id
    ///
    /// Only the scheme is substituted; everything after `://` passes
    /// through untouched. Schemes without a known driver mapping are left
    /// as they are.
    pub fn connection_url(&self) -> String {
        match self.connection.url.split_once("://") {
            Some((scheme, rest)) => format!("{}://{}", resolve_driver(scheme), rest),
            None => self.connection.url.clone(),
        }
    }
}

/// One output row: a patient identifier plus the projected cells
///
/// Compiled statements always project the patient identifier first;
/// runners peel it off and return the remaining cells in select order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// The patient this row belongs to
    pub patient_id: i64,
    /// Remaining projected cells, in select order
    pub cells: Vec<Value>,
}

impl ResultRow {
    pub fn new(patient_id: i64, cells: Vec<Value>) -> Self {
        Self { patient_id, cells }
    }
}

/// The only I/O seam in the pipeline
///
/// A runner owns its connection exclusively; concurrent batch submissions
/// require a connection per batch, which is the implementation's concern.
/// Failures are surfaced as backend errors and never retried here.
#[async_trait]
pub trait QueryRunner: Send + Sync {
    /// Execute one statement and return its rows
    async fn run_query(&self, sql: &str) -> Result<Vec<ResultRow>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use cohortsql_types::ColumnType;

    fn descriptor(url: &str) -> BackendDescriptor {
        BackendDescriptor::new(
            "test",
            ConnectionSpec::new(url),
            [TableSchema::from_primitives(
                "patients",
                [("date_of_birth", ColumnType::Date)],
            )],
        )
    }

    #[test]
    fn test_driver_substitution_in_url() {
        let backend = descriptor("mssql://server/clinical");
        assert_eq!(backend.connection_url(), "sqlserver://server/clinical");
    }

    #[test]
    fn test_unmapped_scheme_passes_through() {
        let backend = descriptor("duckdb://file.db");
        assert_eq!(backend.connection_url(), "duckdb://file.db");
    }

    #[test]
    fn test_unknown_table_is_schema_error() {
        let backend = descriptor("sqlite://:memory:");
        assert!(backend.table_schema("patients").is_ok());
        let err = backend.table_schema("events").unwrap_err();
        assert!(err.code().is_schema_error());
    }
}
