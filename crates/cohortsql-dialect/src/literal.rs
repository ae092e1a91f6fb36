//! Shared strict literal parsing and rendering
//!
//! Date and datetime literals are validated against their destination
//! column's declared type before any SQL is emitted. The accepted formats
//! are deliberately narrow: `YYYY-MM-DD` for dates and ISO-8601 with
//! seconds (`YYYY-MM-DDThh:mm:ss`) for datetimes. Anything else fails with
//! a literal-format error rather than being reinterpreted.

use chrono::{NaiveDate, NaiveDateTime};
use cohortsql_diagnostics::{ExtractError, Result};
use cohortsql_types::{ColumnType, Value};
use once_cell::sync::Lazy;
use regex::Regex;

static DATE_FORMAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

static DATETIME_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}$").unwrap());

/// Escape a string for inclusion in a single-quoted SQL literal
pub fn escape_string(s: &str) -> String {
    s.replace('\'', "''")
}

/// Resolve a value destined for a date column to a calendar date
pub(crate) fn parse_date_literal(value: &Value) -> Result<NaiveDate> {
    match value {
        Value::Date(d) => Ok(*d),
        Value::String(s) => {
            if !DATE_FORMAT.is_match(s) {
                return Err(ExtractError::bad_date_literal(s));
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|_| ExtractError::bad_date_literal(s))
        }
        other => Err(ExtractError::not_comparable(
            other.to_string(),
            ColumnType::Date.to_string(),
        )),
    }
}

/// Resolve a value destined for a datetime column to a timestamp
pub(crate) fn parse_datetime_literal(value: &Value) -> Result<NaiveDateTime> {
    match value {
        Value::DateTime(dt) => Ok(*dt),
        Value::String(s) => {
            if !DATETIME_FORMAT.is_match(s) {
                return Err(ExtractError::bad_datetime_literal(s));
            }
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .map_err(|_| ExtractError::bad_datetime_literal(s))
        }
        other => Err(ExtractError::not_comparable(
            other.to_string(),
            ColumnType::DateTime.to_string(),
        )),
    }
}

/// Render the non-temporal, non-boolean literal cases shared by every
/// dialect; temporal and boolean rendering stays adapter-specific.
pub(crate) fn format_basic(value: &Value, target: ColumnType) -> Result<String> {
    if value.is_null() {
        return Ok("NULL".to_string());
    }
    match target {
        ColumnType::Integer | ColumnType::Float => match value {
            Value::Integer(i) => Ok(i.to_string()),
            Value::Float(x) => {
                if x.is_finite() {
                    // Keep a decimal point so the literal stays a float
                    if x.fract() == 0.0 {
                        Ok(format!("{x:.1}"))
                    } else {
                        Ok(x.to_string())
                    }
                } else {
                    Err(ExtractError::LiteralFormat {
                        code: cohortsql_diagnostics::CSQ0203,
                        literal: x.to_string(),
                        expected: "a finite number".to_string(),
                    })
                }
            }
            other => Err(ExtractError::not_comparable(
                other.to_string(),
                target.to_string(),
            )),
        },
        ColumnType::String => match value {
            Value::String(s) => Ok(format!("'{}'", escape_string(s))),
            other => Err(ExtractError::not_comparable(
                other.to_string(),
                target.to_string(),
            )),
        },
        ColumnType::Code => match value {
            Value::Code(s) | Value::String(s) => Ok(format!("'{}'", escape_string(s))),
            other => Err(ExtractError::not_comparable(
                other.to_string(),
                target.to_string(),
            )),
        },
        ColumnType::Boolean | ColumnType::Date | ColumnType::DateTime => {
            unreachable!("adapter-specific types handled before format_basic")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_date_format() {
        assert!(parse_date_literal(&Value::String("2021-08-03".into())).is_ok());
        assert!(parse_date_literal(&Value::String("2021".into())).is_err());
        assert!(parse_date_literal(&Value::String("2021-8-3".into())).is_err());
        assert!(parse_date_literal(&Value::String("2021-02-30".into())).is_err());
        assert!(parse_date_literal(&Value::String("20210803".into())).is_err());
    }

    #[test]
    fn test_strict_datetime_format() {
        assert!(parse_datetime_literal(&Value::String("2021-08-03T14:00:00".into())).is_ok());
        assert!(parse_datetime_literal(&Value::String("2021-08-03".into())).is_err());
        assert!(parse_datetime_literal(&Value::String("2021-08-03 14:00:00".into())).is_err());
    }

    #[test]
    fn test_numbers_are_not_dates() {
        let err = parse_date_literal(&Value::Integer(20210803)).unwrap_err();
        assert!(err.to_string().contains("date"));
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(escape_string("O'Brien"), "O''Brien");
        assert_eq!(
            format_basic(&Value::String("O'Brien".into()), ColumnType::String).unwrap(),
            "'O''Brien'"
        );
    }

    #[test]
    fn test_null_renders_as_null_keyword() {
        assert_eq!(
            format_basic(&Value::Null, ColumnType::Integer).unwrap(),
            "NULL"
        );
    }

    #[test]
    fn test_whole_floats_keep_decimal_point() {
        assert_eq!(
            format_basic(&Value::Float(2.0), ColumnType::Float).unwrap(),
            "2.0"
        );
        assert_eq!(
            format_basic(&Value::Float(2.5), ColumnType::Float).unwrap(),
            "2.5"
        );
    }
}
