//! Patient-level dataset extraction from clinical-record databases
//!
//! This crate compiles a declarative query model into dialect-specific
//! SQL, executes it against a backend store, and post-processes aggregate
//! results for statistical safety:
//! - a typed, acyclic query model (frames, series, filters, reductions)
//! - a backend-agnostic engine with deterministic SQL compilation
//! - dialect adapters encoding per-backend quirks
//! - batching for wide patient-level join fan-outs
//! - statistical disclosure control for measure results
//!
//! # Example
//!
//! ```ignore
//! use cohortsql::{Dataset, Frame, Series, Value};
//!
//! let events = Frame::event_table("events", events_schema);
//! let diabetes = Frame::filter(
//!     &events,
//!     Series::eq(&events.select("code"), &Series::constant(Value::Code("E119".into()))),
//! );
//!
//! let mut dataset = Dataset::new();
//! dataset.add_column("has_diabetes", Series::exists(&diabetes))?;
//!
//! let rows = engine.execute(&dataset).await?;
//! ```

// Re-export all public APIs from internal crates
pub use cohortsql_diagnostics as diagnostics;
pub use cohortsql_dialect as dialect;
pub use cohortsql_engine as engine;
pub use cohortsql_model as model;
pub use cohortsql_sdc as sdc;
pub use cohortsql_types as types;

// Convenience re-exports
pub use cohortsql_diagnostics::{ExtractError, Result};
pub use cohortsql_dialect::{MssqlDialect, PostgresDialect, SqlDialect, SqliteDialect};
pub use cohortsql_engine::{
    BackendDescriptor, ConnectionSpec, QueryEngine, QueryRunner, ResultRow, SqlEngine,
    split_into_batches,
};
pub use cohortsql_model::{Dataset, Frame, Series, validate_dataset};
pub use cohortsql_sdc::{MeasureRow, apply_sdc, suppress_and_round};
pub use cohortsql_types::{Column, ColumnType, TableSchema, Value};
