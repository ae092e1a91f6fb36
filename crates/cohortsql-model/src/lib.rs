//! Query model for cohort and dataset definitions
//!
//! This crate defines the directed acyclic graph of typed nodes that
//! describes a dataset extraction:
//! - `Frame`: a logical table projection (patient-level or event-level)
//! - `Series`: a single typed column derived from a frame
//! - `Dataset`: the ordered output-column mapping handed to the engine
//! - validation: a single memoized walk that type-checks every node
//!   against the table schemas before any SQL is compiled
//!
//! Nodes are shared through `Arc` and constructed once when a definition is
//! authored; the engine only ever reads the graph. `Arc` ownership makes
//! reference cycles unconstructible, so the graph is acyclic by
//! construction.

mod dataset;
mod frame;
mod series;
mod validate;

pub use dataset::*;
pub use frame::*;
pub use series::*;
pub use validate::*;
