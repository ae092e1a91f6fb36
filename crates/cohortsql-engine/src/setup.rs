//! Schema-creation and bulk-insert statements for test/bulk data
//!
//! Consulted only when loading data into a backend (test fixtures, bulk
//! imports), never when compiling the analytical query. DDL constraint
//! support and multi-row insert support come from the dialect's
//! capability declarations.

use crate::split_into_batches;
use cohortsql_diagnostics::{ExtractError, Result};
use cohortsql_dialect::SqlDialect;
use cohortsql_types::{PATIENT_ID_COLUMN, TableSchema, Value};

/// Render a `CREATE TABLE` statement for a schema
///
/// `unique_patients` marks patient-level tables, which get a primary key
/// on the patient identifier when the dialect supports emitting one. The
/// identifier column is `NOT NULL` where supported; connectors that
/// reject these constraints get the same statement with them stripped.
pub fn create_table_sql(
    dialect: &dyn SqlDialect,
    schema: &TableSchema,
    unique_patients: bool,
) -> String {
    let ddl = dialect.ddl();
    let mut definitions = Vec::new();
    for (name, column_type) in schema.column_types() {
        let mut definition = format!(
            "{} {}",
            dialect.quote_identifier(name),
            dialect.sql_type(column_type)
        );
        if name == PATIENT_ID_COLUMN && ddl.emit_not_null {
            definition.push_str(" NOT NULL");
        }
        definitions.push(definition);
    }
    if unique_patients && ddl.emit_primary_key {
        definitions.push(format!(
            "PRIMARY KEY ({})",
            dialect.quote_identifier(PATIENT_ID_COLUMN)
        ));
    }
    format!(
        "CREATE TABLE {} ({})",
        dialect.quote_identifier(schema.name()),
        definitions.join(", ")
    )
}

/// Render `INSERT` statements loading rows into a table
///
/// Rows are value vectors in schema column order (patient identifier
/// first). Multi-row value lists are used when the dialect supports them,
/// chunked to its per-statement row limit; otherwise one statement per
/// row. Values go through the dialect's strict literal formatting, so a
/// malformed date in test data fails exactly like one in a query.
pub fn insert_rows_sql(
    dialect: &dyn SqlDialect,
    schema: &TableSchema,
    rows: &[Vec<Value>],
) -> Result<Vec<String>> {
    let capabilities = dialect.bulk_insert();
    let columns: Vec<_> = schema.column_types().collect();

    let mut rendered = Vec::with_capacity(rows.len());
    for row in rows {
        if row.len() != columns.len() {
            return Err(ExtractError::row_width(
                schema.name(),
                columns.len(),
                row.len(),
            ));
        }
        let mut values = Vec::with_capacity(row.len());
        for ((_, column_type), value) in columns.iter().zip(row) {
            values.push(dialect.format_literal(value, *column_type)?);
        }
        rendered.push(format!("({})", values.join(", ")));
    }

    let column_list: Vec<String> = columns
        .iter()
        .map(|(name, _)| dialect.quote_identifier(name))
        .collect();
    let prefix = format!(
        "INSERT INTO {} ({}) VALUES ",
        dialect.quote_identifier(schema.name()),
        column_list.join(", ")
    );
    let returning = if capabilities.skip_returning {
        String::new()
    } else {
        format!(" RETURNING {}", dialect.quote_identifier(PATIENT_ID_COLUMN))
    };

    let statements = if capabilities.multi_row_values {
        split_into_batches(rendered, capabilities.max_rows_per_statement)?
            .map(|chunk| format!("{prefix}{}{returning}", chunk.join(", ")))
            .collect()
    } else {
        rendered
            .into_iter()
            .map(|row| format!("{prefix}{row}{returning}"))
            .collect()
    };
    Ok(statements)
}
