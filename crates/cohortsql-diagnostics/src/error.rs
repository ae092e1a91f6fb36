//! Extraction pipeline error types

use crate::{
    CSQ0001, CSQ0002, CSQ0100, CSQ0101, CSQ0102, CSQ0103, CSQ0104, CSQ0105, CSQ0200, CSQ0201,
    CSQ0202, CSQ0300, CSQ0400, CSQ0401, ErrorCode,
};
use thiserror::Error;

/// Main error type for the extraction pipeline
///
/// Every failure surfaced by the pipeline is one of these variants. Schema,
/// query-model, literal-format and batch-configuration errors are all raised
/// during validation or compilation, before any backend I/O is attempted.
/// Backend errors wrap whatever the connector reported, unmodified; retry
/// policy belongs to the caller.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// Reference to an unknown table or column
    #[error("{code}: {message}")]
    Schema {
        code: ErrorCode,
        message: String,
        table: Option<String>,
        column: Option<String>,
    },

    /// Type mismatch or ill-formed query-model graph
    #[error("{code}: {message} (in {node})")]
    QueryModel {
        code: ErrorCode,
        message: String,
        /// Rendered identity of the offending node
        node: String,
    },

    /// Date/datetime literal not in the strict expected format
    #[error("{code}: literal {literal:?} does not match expected format {expected}")]
    LiteralFormat {
        code: ErrorCode,
        literal: String,
        expected: String,
    },

    /// Invalid batching configuration
    #[error("{code}: {message}")]
    BatchConfig { code: ErrorCode, message: String },

    /// The backend rejected or failed a compiled query
    #[error("{code}: {message}")]
    Backend {
        code: ErrorCode,
        message: String,
        /// The statement that failed, when one was submitted
        sql: Option<String>,
    },
}

impl ExtractError {
    /// Create an unknown-table schema error
    pub fn unknown_table(table: impl Into<String>) -> Self {
        let table = table.into();
        Self::Schema {
            code: CSQ0001,
            message: format!("unknown table '{table}'"),
            table: Some(table),
            column: None,
        }
    }

    /// Create an unknown-column schema error
    pub fn unknown_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        let table = table.into();
        let column = column.into();
        Self::Schema {
            code: CSQ0002,
            message: format!("unknown column '{column}' in table '{table}'"),
            table: Some(table),
            column: Some(column),
        }
    }

    /// Create a schema-mismatch error for a table whose declared schema
    /// differs from the backend's
    pub fn schema_mismatch(table: impl Into<String>) -> Self {
        let table = table.into();
        Self::Schema {
            code: crate::CSQ0005,
            message: format!("schema for table '{table}' differs from the backend's declaration"),
            table: Some(table),
            column: None,
        }
    }

    /// Create a row-width error for bulk-loaded data
    pub fn row_width(table: impl Into<String>, expected: usize, found: usize) -> Self {
        let table = table.into();
        Self::Schema {
            code: crate::CSQ0006,
            message: format!(
                "row for table '{table}' has {found} values, schema declares {expected} columns"
            ),
            table: Some(table),
            column: None,
        }
    }

    /// Create a type-mismatch query-model error
    pub fn type_mismatch(
        expected: impl Into<String>,
        found: impl Into<String>,
        node: impl Into<String>,
    ) -> Self {
        Self::QueryModel {
            code: CSQ0100,
            message: format!("expected {}, found {}", expected.into(), found.into()),
            node: node.into(),
        }
    }

    /// Create an incompatible-operands query-model error
    pub fn incompatible_operands(
        operation: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
        node: impl Into<String>,
    ) -> Self {
        Self::QueryModel {
            code: CSQ0101,
            message: format!(
                "operands {} and {} are incompatible for {}",
                left.into(),
                right.into(),
                operation.into()
            ),
            node: node.into(),
        }
    }

    /// Create a non-boolean-predicate query-model error
    pub fn non_boolean_predicate(found: impl Into<String>, node: impl Into<String>) -> Self {
        Self::QueryModel {
            code: CSQ0102,
            message: format!("predicate must be boolean, found {}", found.into()),
            node: node.into(),
        }
    }

    /// Create a frame-dimension query-model error
    pub fn dimension_violation(message: impl Into<String>, node: impl Into<String>) -> Self {
        Self::QueryModel {
            code: CSQ0103,
            message: message.into(),
            node: node.into(),
        }
    }

    /// Create a duplicate-output-column query-model error
    pub fn duplicate_column(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::QueryModel {
            code: CSQ0104,
            message: format!("duplicate output column '{name}'"),
            node: name,
        }
    }

    /// Create an out-of-category query-model error
    pub fn outside_categories(value: impl Into<String>, node: impl Into<String>) -> Self {
        Self::QueryModel {
            code: CSQ0105,
            message: format!("value {} is outside the declared categories", value.into()),
            node: node.into(),
        }
    }

    /// Create a generic query-model error with an explicit code
    pub fn query_model(code: ErrorCode, message: impl Into<String>, node: impl Into<String>) -> Self {
        Self::QueryModel {
            code,
            message: message.into(),
            node: node.into(),
        }
    }

    /// Create an invalid-date-literal error
    pub fn bad_date_literal(literal: impl Into<String>) -> Self {
        Self::LiteralFormat {
            code: CSQ0200,
            literal: literal.into(),
            expected: "YYYY-MM-DD".to_string(),
        }
    }

    /// Create an invalid-datetime-literal error
    pub fn bad_datetime_literal(literal: impl Into<String>) -> Self {
        Self::LiteralFormat {
            code: CSQ0201,
            literal: literal.into(),
            expected: "YYYY-MM-DDThh:mm:ss".to_string(),
        }
    }

    /// Create a value-not-comparable dialect error
    pub fn not_comparable(value: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self::QueryModel {
            code: CSQ0202,
            message: format!(
                "value {} cannot be compared to a {} column",
                value.into(),
                column_type.into()
            ),
            node: "literal comparison".to_string(),
        }
    }

    /// Create an invalid-batch-size error
    pub fn invalid_batch_size(size: usize) -> Self {
        Self::BatchConfig {
            code: CSQ0300,
            message: format!("batch size must be at least 1, got {size}"),
        }
    }

    /// Create a backend execution error
    pub fn backend_failure(message: impl Into<String>, sql: Option<String>) -> Self {
        Self::Backend {
            code: CSQ0400,
            message: message.into(),
            sql,
        }
    }

    /// Create an unknown-backend error
    pub fn unknown_backend(name: impl Into<String>) -> Self {
        Self::Backend {
            code: CSQ0401,
            message: format!("unknown backend '{}'", name.into()),
            sql: None,
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Schema { code, .. } => *code,
            Self::QueryModel { code, .. } => *code,
            Self::LiteralFormat { code, .. } => *code,
            Self::BatchConfig { code, .. } => *code,
            Self::Backend { code, .. } => *code,
        }
    }

    /// True if this error was raised before any backend I/O
    pub fn is_pre_execution(&self) -> bool {
        !matches!(self, Self::Backend { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_column_carries_context() {
        let err = ExtractError::unknown_column("events", "dose");
        assert_eq!(err.code(), CSQ0002);
        match err {
            ExtractError::Schema { table, column, .. } => {
                assert_eq!(table.as_deref(), Some("events"));
                assert_eq!(column.as_deref(), Some("dose"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_query_model_error_names_node() {
        let err = ExtractError::type_mismatch("integer", "date", "add(age, date_of_birth)");
        assert!(err.to_string().contains("add(age, date_of_birth)"));
        assert!(err.is_pre_execution());
    }

    #[test]
    fn test_literal_format_display() {
        let err = ExtractError::bad_date_literal("2021");
        let rendered = err.to_string();
        assert!(rendered.contains("2021"));
        assert!(rendered.contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_backend_errors_are_not_pre_execution() {
        let err = ExtractError::backend_failure("connection reset", None);
        assert!(!err.is_pre_execution());
    }
}
