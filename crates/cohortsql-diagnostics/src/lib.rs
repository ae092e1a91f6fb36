//! Diagnostics and error handling for the cohortsql extraction pipeline
//!
//! This crate provides the error infrastructure shared by every stage of the
//! pipeline: structured error codes, the `ExtractError` taxonomy, and the
//! crate-wide `Result` alias. All validation errors carry enough context to
//! identify the offending schema reference, query-model node, or literal
//! without access to the original definition source.

mod error;
mod error_code;

pub use error::*;
pub use error_code::*;

/// Result type for extraction-pipeline operations
pub type Result<T> = std::result::Result<T, ExtractError>;
