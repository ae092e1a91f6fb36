//! The dialect contract and its capability declarations

use cohortsql_diagnostics::Result;
use cohortsql_types::{ColumnType, Value};

/// DDL constraint support
///
/// Some connectors (notably the in-memory test connector) reject `NOT NULL`
/// and primary-key constraints; schema-creation statements for them are
/// emitted with these constraints stripped while all other DDL semantics
/// stay intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DdlCapabilities {
    /// Emit `NOT NULL` on the patient identifier column
    pub emit_not_null: bool,
    /// Emit a primary-key constraint on patient-level tables
    pub emit_primary_key: bool,
}

impl Default for DdlCapabilities {
    fn default() -> Self {
        Self {
            emit_not_null: true,
            emit_primary_key: true,
        }
    }
}

/// Bulk-insert support, consulted only when loading test/bulk data
///
/// Never consulted when compiling the analytical query itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkInsertCapabilities {
    /// The backend accepts multi-row value lists in a single statement
    pub multi_row_values: bool,
    /// `RETURNING`-style clauses can be skipped during bulk loads
    pub skip_returning: bool,
    /// Upper bound on rows per statement, when the backend imposes one
    pub max_rows_per_statement: Option<usize>,
}

/// A backend dialect adapter
///
/// Translates the backend-agnostic literal/type model into backend-correct
/// SQL fragments and declares the backend's capabilities. Implementations
/// must be stateless: formatting the same value twice yields the same text.
pub trait SqlDialect: Send + Sync {
    /// Canonical dialect name
    fn name(&self) -> &'static str;

    /// Quote an identifier for this backend
    fn quote_identifier(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    /// The DDL type name for a column type
    fn sql_type(&self, column_type: ColumnType) -> &'static str;

    /// Render a value as a SQL literal for a column of the given type
    ///
    /// Strict: a malformed date/datetime string fails with a
    /// literal-format error, and a value whose type cannot be compared to
    /// the target column type fails with a type-mismatch error. Neither is
    /// ever silently truncated or reinterpreted.
    fn format_literal(&self, value: &Value, target: ColumnType) -> Result<String>;

    /// DDL constraint support
    fn ddl(&self) -> DdlCapabilities {
        DdlCapabilities::default()
    }

    /// Bulk-insert support
    fn bulk_insert(&self) -> BulkInsertCapabilities;

    /// Maximum number of table expressions the backend safely joins in one
    /// statement; `None` means unbounded
    fn max_joins_per_query(&self) -> Option<usize> {
        None
    }
}
