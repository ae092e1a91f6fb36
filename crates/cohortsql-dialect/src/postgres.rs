//! PostgreSQL adapter

use crate::capability::{BulkInsertCapabilities, SqlDialect};
use crate::literal::{format_basic, parse_date_literal, parse_datetime_literal};
use cohortsql_diagnostics::{ExtractError, Result};
use cohortsql_types::{ColumnType, Value};

/// PostgreSQL dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn sql_type(&self, column_type: ColumnType) -> &'static str {
        match column_type {
            ColumnType::Integer => "BIGINT",
            ColumnType::Float => "DOUBLE PRECISION",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Date => "DATE",
            ColumnType::DateTime => "TIMESTAMP",
            ColumnType::String | ColumnType::Code => "TEXT",
        }
    }

    fn format_literal(&self, value: &Value, target: ColumnType) -> Result<String> {
        if value.is_null() {
            return Ok("NULL".to_string());
        }
        match target {
            ColumnType::Date => {
                let date = parse_date_literal(value)?;
                Ok(format!("DATE '{}'", date.format("%Y-%m-%d")))
            }
            ColumnType::DateTime => {
                let dt = parse_datetime_literal(value)?;
                Ok(format!("TIMESTAMP '{}'", dt.format("%Y-%m-%d %H:%M:%S")))
            }
            ColumnType::Boolean => match value {
                Value::Boolean(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
                other => Err(ExtractError::not_comparable(
                    other.to_string(),
                    target.to_string(),
                )),
            },
            other => format_basic(value, other),
        }
    }

    fn bulk_insert(&self) -> BulkInsertCapabilities {
        BulkInsertCapabilities {
            multi_row_values: true,
            skip_returning: true,
            max_rows_per_statement: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_date_literal() {
        assert_eq!(
            PostgresDialect
                .format_literal(&Value::String("2021-08-03".into()), ColumnType::Date)
                .unwrap(),
            "DATE '2021-08-03'"
        );
    }

    #[test]
    fn test_constraints_kept() {
        let ddl = PostgresDialect.ddl();
        assert!(ddl.emit_not_null);
        assert!(ddl.emit_primary_key);
    }
}
