//! Query engine for the cohortsql extraction pipeline
//!
//! The engine turns a validated dataset definition into dialect-specific
//! SQL and executes it against a backend:
//! - `compiler`: one deterministic walk of the query-model DAG producing
//!   CTE-structured SQL (stable alias numbering, shared sub-expressions
//!   compiled once)
//! - `batching`: splits wide patient-level join fan-outs into
//!   backend-safe chunks
//! - `backend`: the backend descriptor and the async `QueryRunner` seam
//! - `engine`: the `QueryEngine` lifecycle (validate, compile, run,
//!   combine) and the concrete `SqlEngine`
//! - `setup`: schema-creation and bulk-insert statements for loading
//!   test data, honouring each dialect's DDL and insert capabilities

mod backend;
mod batching;
mod compiler;
mod engine;
mod setup;

pub use backend::*;
pub use batching::*;
pub use compiler::*;
pub use engine::*;
pub use setup::*;
