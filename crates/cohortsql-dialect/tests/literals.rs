//! Literal Formatting Tests
//!
//! Cross-dialect behaviour: strict date/datetime formats, type mismatch
//! rejection, null rendering, and per-dialect literal syntax.

use cohortsql_dialect::{MssqlDialect, PostgresDialect, SqlDialect, SqliteDialect};
use cohortsql_types::{ColumnType, Value};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn dialects() -> Vec<Box<dyn SqlDialect>> {
    vec![
        Box::new(SqliteDialect),
        Box::new(PostgresDialect),
        Box::new(MssqlDialect),
    ]
}

// ============================================================================
// Date literals
// ============================================================================

#[rstest]
#[case("sqlite", "'2021-08-03'")]
#[case("postgres", "DATE '2021-08-03'")]
#[case("mssql", "'20210803'")]
fn test_date_literal_per_dialect(#[case] name: &str, #[case] expected: &str) {
    let dialect = dialects()
        .into_iter()
        .find(|d| d.name() == name)
        .expect("dialect exists");
    let rendered = dialect
        .format_literal(&Value::String("2021-08-03".into()), ColumnType::Date)
        .unwrap();
    assert_eq!(rendered, expected);
}

#[rstest]
#[case("2021")]
#[case("03-08-2021")]
#[case("2021/08/03")]
#[case("2021-13-01")]
#[case("2021-08-03T00:00:00")]
fn test_malformed_dates_rejected_everywhere(#[case] literal: &str) {
    for dialect in dialects() {
        let err = dialect
            .format_literal(&Value::String(literal.into()), ColumnType::Date)
            .unwrap_err();
        assert!(
            err.code().is_dialect_error(),
            "{}: expected dialect error for {literal:?}, got {err}",
            dialect.name()
        );
    }
}

#[test]
fn test_datetime_requires_seconds() {
    for dialect in dialects() {
        assert!(
            dialect
                .format_literal(&Value::String("2021-08-03T14:00".into()), ColumnType::DateTime)
                .is_err(),
            "{} accepted a datetime without seconds",
            dialect.name()
        );
        assert!(
            dialect
                .format_literal(
                    &Value::String("2021-08-03T14:00:00".into()),
                    ColumnType::DateTime
                )
                .is_ok(),
            "{} rejected a valid datetime",
            dialect.name()
        );
    }
}

// ============================================================================
// Type mismatches
// ============================================================================

#[test]
fn test_numbers_do_not_compare_to_temporal_columns() {
    for dialect in dialects() {
        for target in [ColumnType::Date, ColumnType::DateTime] {
            let err = dialect
                .format_literal(&Value::Integer(20210803), target)
                .unwrap_err();
            assert!(err.is_pre_execution());
        }
    }
}

#[test]
fn test_string_rejected_for_integer_column() {
    for dialect in dialects() {
        assert!(
            dialect
                .format_literal(&Value::String("12".into()), ColumnType::Integer)
                .is_err()
        );
    }
}

// ============================================================================
// Nulls and plain values
// ============================================================================

#[test]
fn test_null_renders_as_null_for_every_target() {
    for dialect in dialects() {
        for target in [
            ColumnType::Integer,
            ColumnType::Float,
            ColumnType::Boolean,
            ColumnType::Date,
            ColumnType::DateTime,
            ColumnType::String,
            ColumnType::Code,
        ] {
            assert_eq!(dialect.format_literal(&Value::Null, target).unwrap(), "NULL");
        }
    }
}

#[test]
fn test_formatting_is_deterministic() {
    for dialect in dialects() {
        let a = dialect
            .format_literal(&Value::String("2021-08-03".into()), ColumnType::Date)
            .unwrap();
        let b = dialect
            .format_literal(&Value::String("2021-08-03".into()), ColumnType::Date)
            .unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn test_quote_styles() {
    assert_eq!(SqliteDialect.quote_identifier("events"), "\"events\"");
    assert_eq!(PostgresDialect.quote_identifier("events"), "\"events\"");
    assert_eq!(MssqlDialect.quote_identifier("events"), "[events]");
}
