//! Error codes following a structured numbering system
//!
//! Error code ranges:
//! - CSQ0001-CSQ0099: Schema errors (unknown tables/columns, bad primitives)
//! - CSQ0100-CSQ0199: Query-model errors (type checking, frame dimensions)
//! - CSQ0200-CSQ0299: Dialect errors (literal formats, unsupported values)
//! - CSQ0300-CSQ0399: Configuration errors (batching, engine setup)
//! - CSQ0400-CSQ0499: Backend errors (execution failures, unknown backends)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Check if this is a schema error (0001-0099)
    pub const fn is_schema_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    /// Check if this is a query-model error (0100-0199)
    pub const fn is_query_model_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Check if this is a dialect error (0200-0299)
    pub const fn is_dialect_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Check if this is a configuration error (0300-0399)
    pub const fn is_config_error(&self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    /// Check if this is a backend error (0400-0499)
    pub const fn is_backend_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CSQ{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

// Static error info storage
static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

use std::collections::HashMap;
use std::sync::LazyLock;

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Schema errors (0001-0099)
    map.insert(1, ErrorInfo::new("Unknown table"));
    map.insert(
        2,
        ErrorInfo::new("Unknown column")
            .with_help("Check the column name against the table schema"),
    );
    map.insert(3, ErrorInfo::new("Duplicate column declaration"));
    map.insert(4, ErrorInfo::new("Missing patient identifier column"));
    map.insert(
        5,
        ErrorInfo::new("Table schema differs from the backend's declaration"),
    );
    map.insert(6, ErrorInfo::new("Row width does not match the table schema"));

    // Query-model errors (0100-0199)
    map.insert(100, ErrorInfo::new("Type mismatch"));
    map.insert(101, ErrorInfo::new("Incompatible operand types"));
    map.insert(102, ErrorInfo::new("Non-boolean predicate"));
    map.insert(
        103,
        ErrorInfo::new("Frame dimension violation").with_help(
            "Series drawn from different event frames cannot be combined directly; \
             reduce each to patient level first",
        ),
    );
    map.insert(104, ErrorInfo::new("Duplicate output column name"));
    map.insert(105, ErrorInfo::new("Value outside declared categories"));
    map.insert(106, ErrorInfo::new("Inconsistent category result types"));
    map.insert(107, ErrorInfo::new("Aggregation over a patient frame"));
    map.insert(108, ErrorInfo::new("Sort key is not orderable"));
    map.insert(109, ErrorInfo::new("Predicate not rooted in filtered frame"));

    // Dialect errors (0200-0299)
    map.insert(
        200,
        ErrorInfo::new("Invalid date literal format")
            .with_help("Date literals must be YYYY-MM-DD"),
    );
    map.insert(
        201,
        ErrorInfo::new("Invalid datetime literal format")
            .with_help("Datetime literals must be YYYY-MM-DDThh:mm:ss"),
    );
    map.insert(202, ErrorInfo::new("Value type not comparable to column type"));
    map.insert(203, ErrorInfo::new("Value not representable in dialect"));

    // Configuration errors (0300-0399)
    map.insert(
        300,
        ErrorInfo::new("Invalid batch size").with_help("Batch size must be at least 1"),
    );

    // Backend errors (0400-0499)
    map.insert(400, ErrorInfo::new("Backend execution failed"));
    map.insert(401, ErrorInfo::new("Unknown backend"));
    map.insert(402, ErrorInfo::new("Malformed connection parameters"));

    map
});

// Convenient error code constants

// Schema errors
pub const CSQ0001: ErrorCode = ErrorCode::new(1);
pub const CSQ0002: ErrorCode = ErrorCode::new(2);
pub const CSQ0003: ErrorCode = ErrorCode::new(3);
pub const CSQ0004: ErrorCode = ErrorCode::new(4);
pub const CSQ0005: ErrorCode = ErrorCode::new(5);
pub const CSQ0006: ErrorCode = ErrorCode::new(6);

// Query-model errors
pub const CSQ0100: ErrorCode = ErrorCode::new(100);
pub const CSQ0101: ErrorCode = ErrorCode::new(101);
pub const CSQ0102: ErrorCode = ErrorCode::new(102);
pub const CSQ0103: ErrorCode = ErrorCode::new(103);
pub const CSQ0104: ErrorCode = ErrorCode::new(104);
pub const CSQ0105: ErrorCode = ErrorCode::new(105);
pub const CSQ0106: ErrorCode = ErrorCode::new(106);
pub const CSQ0107: ErrorCode = ErrorCode::new(107);
pub const CSQ0108: ErrorCode = ErrorCode::new(108);
pub const CSQ0109: ErrorCode = ErrorCode::new(109);

// Dialect errors
pub const CSQ0200: ErrorCode = ErrorCode::new(200);
pub const CSQ0201: ErrorCode = ErrorCode::new(201);
pub const CSQ0202: ErrorCode = ErrorCode::new(202);
pub const CSQ0203: ErrorCode = ErrorCode::new(203);

// Configuration errors
pub const CSQ0300: ErrorCode = ErrorCode::new(300);

// Backend errors
pub const CSQ0400: ErrorCode = ErrorCode::new(400);
pub const CSQ0401: ErrorCode = ErrorCode::new(401);
pub const CSQ0402: ErrorCode = ErrorCode::new(402);
