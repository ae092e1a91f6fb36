//! Primitive column types and column declarations

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of primitive semantic column types
///
/// These are backend-independent; each dialect adapter decides how a type is
/// rendered in DDL and how literals of the type are formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// 64-bit signed integer
    Integer,
    /// Double-precision float
    Float,
    /// Boolean (true/false/null)
    Boolean,
    /// Calendar date, no time component
    Date,
    /// Date and time with seconds precision
    DateTime,
    /// Unicode string
    String,
    /// Clinical code (stored as text, compared exactly)
    Code,
}

impl ColumnType {
    /// Check if this type supports arithmetic
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    /// Check if this is a temporal type
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::DateTime)
    }

    /// Check if this type supports ordering comparisons
    pub fn is_orderable(&self) -> bool {
        !matches!(self, Self::Boolean | Self::Code)
    }

    /// Check if two types may appear on either side of a comparison
    ///
    /// Identical types always compare; the numeric pair is the only
    /// cross-type comparison allowed.
    pub fn is_comparable_with(&self, other: &ColumnType) -> bool {
        self == other || (self.is_numeric() && other.is_numeric())
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Boolean => write!(f, "boolean"),
            Self::Date => write!(f, "date"),
            Self::DateTime => write!(f, "datetime"),
            Self::String => write!(f, "string"),
            Self::Code => write!(f, "code"),
        }
    }
}

/// A single column declaration: type plus optional allowed categories
///
/// `categories`, when present, is an ordered set of allowed values; any
/// value outside it is invalid. Equality and hashing are structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// The column's semantic type
    pub column_type: ColumnType,
    /// Allowed values, in declaration order, if the column is categorical
    pub categories: Option<Vec<String>>,
}

impl Column {
    /// Create a plain column of the given type
    pub fn new(column_type: ColumnType) -> Self {
        Self {
            column_type,
            categories: None,
        }
    }

    /// Create a categorical column with the given allowed values
    pub fn with_categories<S: Into<String>>(
        column_type: ColumnType,
        categories: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            column_type,
            categories: Some(categories.into_iter().map(Into::into).collect()),
        }
    }

    /// Check whether a rendered value is inside the declared categories
    ///
    /// Columns without categories accept any value.
    pub fn accepts_category(&self, value: &str) -> bool {
        match &self.categories {
            Some(allowed) => allowed.iter().any(|c| c == value),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_predicates() {
        assert!(ColumnType::Integer.is_numeric());
        assert!(ColumnType::Float.is_numeric());
        assert!(!ColumnType::Date.is_numeric());
    }

    #[test]
    fn test_comparability() {
        assert!(ColumnType::Integer.is_comparable_with(&ColumnType::Float));
        assert!(ColumnType::Date.is_comparable_with(&ColumnType::Date));
        assert!(!ColumnType::Date.is_comparable_with(&ColumnType::Integer));
        assert!(!ColumnType::Code.is_comparable_with(&ColumnType::String));
    }

    #[test]
    fn test_columns_compare_structurally() {
        let a = Column::with_categories(ColumnType::Code, ["A", "B"]);
        let b = Column::with_categories(ColumnType::Code, ["A", "B"]);
        assert_eq!(a, b);
        assert!(a.accepts_category("A"));
        assert!(!a.accepts_category("C"));
        assert!(Column::new(ColumnType::String).accepts_category("anything"));
    }
}
