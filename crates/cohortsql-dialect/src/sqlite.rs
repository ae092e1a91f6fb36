//! SQLite adapter, also used as the in-memory test connector

use crate::capability::{BulkInsertCapabilities, DdlCapabilities, SqlDialect};
use crate::literal::{format_basic, parse_date_literal, parse_datetime_literal};
use cohortsql_diagnostics::Result;
use cohortsql_types::{ColumnType, Value};

/// SQLite dialect
///
/// This is the connector the in-memory test backend runs on; its DDL layer
/// rejects `NOT NULL` and primary-key constraints, so both are stripped
/// from schema-creation statements.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn sql_type(&self, column_type: ColumnType) -> &'static str {
        match column_type {
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "REAL",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Date => "DATE",
            ColumnType::DateTime => "DATETIME",
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
                Ok(format!("'{}'", date.format("%Y-%m-%d")))
            }
            ColumnType::DateTime => {
                let dt = parse_datetime_literal(value)?;
                Ok(format!("'{}'", dt.format("%Y-%m-%dT%H:%M:%S")))
            }
            ColumnType::Boolean => match value {
                Value::Boolean(b) => Ok(if *b { "1" } else { "0" }.to_string()),
                other => Err(cohortsql_diagnostics::ExtractError::not_comparable(
                    other.to_string(),
                    target.to_string(),
                )),
            },
            other => format_basic(value, other),
        }
    }

    fn ddl(&self) -> DdlCapabilities {
        DdlCapabilities {
            emit_not_null: false,
            emit_primary_key: false,
        }
    }

    fn bulk_insert(&self) -> BulkInsertCapabilities {
        BulkInsertCapabilities {
            multi_row_values: true,
            skip_returning: true,
            max_rows_per_statement: Some(500),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_literal_rendering() {
        let dialect = SqliteDialect;
        assert_eq!(
            dialect
                .format_literal(&Value::String("2021-08-03".into()), ColumnType::Date)
                .unwrap(),
            "'2021-08-03'"
        );
    }

    #[test]
    fn test_constraints_suppressed() {
        let ddl = SqliteDialect.ddl();
        assert!(!ddl.emit_not_null);
        assert!(!ddl.emit_primary_key);
    }
}
