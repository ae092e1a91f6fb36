//! Column type system for clinical-record tables
//!
//! This crate defines:
//! - `ColumnType`, the closed set of primitive semantic column types
//! - `Column` and `TableSchema`, the immutable per-table type declarations
//! - `Value`, the runtime cell representation used by results and literals
//!
//! Schemas are built once per backend at startup and never mutated; they
//! compare and hash structurally so two schemas built from the same
//! primitives are interchangeable.

mod column;
mod schema;
mod value;

pub use column::*;
pub use schema::*;
pub use value::*;

/// Name of the implicit patient-identifier column carried by every table
pub const PATIENT_ID_COLUMN: &str = "patient_id";
