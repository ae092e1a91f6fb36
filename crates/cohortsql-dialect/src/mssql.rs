//! Microsoft SQL Server adapter

use crate::capability::{BulkInsertCapabilities, SqlDialect};
use crate::literal::{format_basic, parse_date_literal, parse_datetime_literal};
use cohortsql_diagnostics::{ExtractError, Result};
use cohortsql_types::{ColumnType, Value};

/// SQL Server dialect
///
/// Date literals use the 8-digit `YYYYMMDD` form, which SQL Server parses
/// identically under every language/dateformat setting; the hyphenated
/// form does not.
#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlDialect;

impl SqlDialect for MssqlDialect {
    fn name(&self) -> &'static str {
        "mssql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!("[{}]", ident.replace(']', "]]"))
    }

    fn sql_type(&self, column_type: ColumnType) -> &'static str {
        match column_type {
            ColumnType::Integer => "BIGINT",
            ColumnType::Float => "FLOAT",
            ColumnType::Boolean => "BIT",
            ColumnType::Date => "DATE",
            ColumnType::DateTime => "DATETIME2",
            ColumnType::String => "NVARCHAR(MAX)",
            ColumnType::Code => "NVARCHAR(128)",
        }
    }

    fn format_literal(&self, value: &Value, target: ColumnType) -> Result<String> {
        if value.is_null() {
            return Ok("NULL".to_string());
        }
        match target {
            ColumnType::Date => {
                let date = parse_date_literal(value)?;
                Ok(format!("'{}'", date.format("%Y%m%d")))
            }
            ColumnType::DateTime => {
                let dt = parse_datetime_literal(value)?;
                Ok(format!("'{}'", dt.format("%Y-%m-%dT%H:%M:%S")))
            }
            ColumnType::Boolean => match value {
                Value::Boolean(b) => Ok(if *b { "1" } else { "0" }.to_string()),
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
            max_rows_per_statement: Some(1000),
        }
    }

    fn max_joins_per_query(&self) -> Option<usize> {
        Some(10)
    }
}
