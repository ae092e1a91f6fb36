//! Facade API Tests
//!
//! The whole pipeline is reachable through the facade re-exports.

use cohortsql::{
    ColumnType, Dataset, Frame, Series, SqlDialect, SqliteDialect, TableSchema, Value,
    split_into_batches, suppress_and_round, validate_dataset,
};
use pretty_assertions::assert_eq;

#[test]
fn test_definition_to_validation_through_facade() {
    let events = Frame::event_table(
        "events",
        TableSchema::from_primitives(
            "events",
            [("date", ColumnType::Date), ("code", ColumnType::Code)],
        ),
    );
    let flu = Frame::filter(
        &events,
        Series::eq(
            &events.select("code"),
            &Series::constant(Value::Code("J111".into())),
        ),
    );

    let mut dataset = Dataset::new();
    dataset.add_column("had_flu", Series::exists(&flu)).unwrap();

    let validated = validate_dataset(&dataset).unwrap();
    let columns: Vec<_> = validated.output_columns().collect();
    assert_eq!(columns, vec![("had_flu", Some(ColumnType::Boolean))]);
}

#[test]
fn test_utilities_reachable_through_facade() {
    assert_eq!(suppress_and_round(12), 10);
    let batches: Vec<Vec<i32>> = split_into_batches(vec![1, 2, 3], Some(2)).unwrap().collect();
    assert_eq!(batches, vec![vec![1, 2], vec![3]]);
    assert_eq!(SqliteDialect.name(), "sqlite");
}
