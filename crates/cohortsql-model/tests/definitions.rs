//! Definition Graph Tests
//!
//! Whole-definition behaviour through the public API: shared nodes,
//! validation order, and error reporting with node identities.

use cohortsql_model::{Dataset, Frame, Series, validate_dataset};
use cohortsql_types::{Column, ColumnType, TableSchema, Value};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn patients() -> Arc<Frame> {
    Frame::patient_table(
        "patients",
        TableSchema::from_columns(
            "patients",
            [
                ("date_of_birth", Column::new(ColumnType::Date)),
                (
                    "sex",
                    Column::with_categories(ColumnType::String, ["male", "female"]),
                ),
            ],
        ),
    )
}

fn medications() -> Arc<Frame> {
    Frame::event_table(
        "medications",
        TableSchema::from_primitives(
            "medications",
            [
                ("date", ColumnType::Date),
                ("dmd_code", ColumnType::Code),
                ("dose", ColumnType::Float),
            ],
        ),
    )
}

#[test]
fn test_full_definition_validates() {
    let patients = patients();
    let medications = medications();

    let statins = Frame::filter(
        &medications,
        Series::eq(
            &medications.select("dmd_code"),
            &Series::constant(Value::Code("40129711000001100".into())),
        ),
    );
    let first_statin = Frame::pick_first(&statins, [statins.select("date")]);

    let mut dataset = Dataset::new();
    dataset.add_column("sex", patients.select("sex")).unwrap();
    dataset
        .add_column("on_statins", Series::exists(&statins))
        .unwrap();
    dataset
        .add_column("statin_count", Series::count(&statins))
        .unwrap();
    dataset
        .add_column("first_statin_date", first_statin.select("date"))
        .unwrap();
    dataset
        .add_column("first_statin_dose", first_statin.select("dose"))
        .unwrap();
    dataset.set_population(Series::is_not_null(&patients.select("date_of_birth")));

    let validated = validate_dataset(&dataset).unwrap();
    let columns: Vec<_> = validated.output_columns().collect();
    assert_eq!(
        columns,
        vec![
            ("sex", Some(ColumnType::String)),
            ("on_statins", Some(ColumnType::Boolean)),
            ("statin_count", Some(ColumnType::Integer)),
            ("first_statin_date", Some(ColumnType::Date)),
            ("first_statin_dose", Some(ColumnType::Float)),
        ]
    );
}

#[test]
fn test_shared_nodes_validate_once_and_agree() {
    let medications = medications();
    let dose = medications.select("dose");
    // The same Arc node feeds two different expressions
    let high = Series::gt(&dose, &Series::constant(Value::Float(40.0)));
    let low = Series::lt(&dose, &Series::constant(Value::Float(10.0)));
    let either = Series::or(&high, &low);
    let filtered = Frame::filter(&medications, either);

    let mut dataset = Dataset::new();
    dataset
        .add_column("outlier_doses", Series::count(&filtered))
        .unwrap();
    validate_dataset(&dataset).unwrap();
}

#[test]
fn test_error_reports_name_the_offending_node() {
    let patients = patients();
    let medications = medications();
    let mut dataset = Dataset::new();
    dataset
        .add_column(
            "nonsense",
            Series::add(&patients.select("date_of_birth"), &medications.select("dose")),
        )
        .unwrap();

    let err = validate_dataset(&dataset).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("add(patients.date_of_birth, medications.dose)"));
}
