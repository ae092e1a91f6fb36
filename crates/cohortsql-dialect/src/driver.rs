//! Logical backend names, driver aliasing and dialect selection

use crate::{MssqlDialect, PostgresDialect, SqlDialect, SqliteDialect};
use cohortsql_diagnostics::{ExtractError, Result};

/// Substitute a more specific driver identifier for a logical backend name
///
/// Only the driver id changes; connection parameters are left untouched by
/// callers. Unmapped names pass through unchanged.
pub fn resolve_driver(name: &str) -> &str {
    match name {
        "mssql" => "sqlserver",
        "postgresql" => "postgres",
        "memory" => "sqlite",
        other => other,
    }
}

/// Look up the dialect adapter for a logical backend name
pub fn dialect_for(name: &str) -> Result<Box<dyn SqlDialect>> {
    match resolve_driver(name) {
        "sqlite" => Ok(Box::new(SqliteDialect)),
        "postgres" => Ok(Box::new(PostgresDialect)),
        "sqlserver" => Ok(Box::new(MssqlDialect)),
        other => Err(ExtractError::unknown_backend(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_aliases() {
        assert_eq!(resolve_driver("mssql"), "sqlserver");
        assert_eq!(resolve_driver("postgresql"), "postgres");
        assert_eq!(resolve_driver("memory"), "sqlite");
    }

    #[test]
    fn test_unmapped_names_pass_through() {
        assert_eq!(resolve_driver("duckdb"), "duckdb");
        assert_eq!(resolve_driver("sqlite"), "sqlite");
    }

    #[test]
    fn test_dialect_selection() {
        assert_eq!(dialect_for("memory").unwrap().name(), "sqlite");
        assert_eq!(dialect_for("mssql").unwrap().name(), "mssql");
        assert!(dialect_for("oracle").is_err());
    }
}
