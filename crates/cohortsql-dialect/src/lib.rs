//! Dialect adapters for the extraction pipeline
//!
//! Each supported backend gets a small adapter translating the
//! backend-agnostic literal/type model into backend-correct SQL fragments
//! and declaring the backend's capabilities:
//! - strict literal formatting (malformed date/datetime literals fail
//!   before any SQL is emitted)
//! - DDL constraint support (the in-memory test connector strips
//!   `NOT NULL` and primary-key constraints)
//! - bulk-insert support (multi-row value lists, `RETURNING` suppression)
//!
//! Capabilities are adapter-local accessors rather than a deep override
//! hierarchy, so a new backend composes only the quirks it has.

mod capability;
mod driver;
mod literal;
mod mssql;
mod postgres;
mod sqlite;

pub use capability::*;
pub use driver::*;
pub use literal::escape_string;
pub use mssql::MssqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;
