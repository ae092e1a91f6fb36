//! Runtime cell values

use crate::ColumnType;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single runtime cell: a literal in the query model, or a value in a
/// result row
///
/// Absent values are always `Value::Null`, never a type-specific sentinel
/// such as an empty string for a missing date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    /// The explicit null marker
    Null,
    /// Boolean value
    Boolean(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// Double-precision float
    Float(f64),
    /// Unicode string
    String(String),
    /// Calendar date
    Date(NaiveDate),
    /// Date and time, seconds precision
    DateTime(NaiveDateTime),
    /// Clinical code
    Code(String),
}

impl Value {
    /// The column type this value naturally belongs to, or `None` for null
    pub fn type_of(&self) -> Option<ColumnType> {
        match self {
            Self::Null => None,
            Self::Boolean(_) => Some(ColumnType::Boolean),
            Self::Integer(_) => Some(ColumnType::Integer),
            Self::Float(_) => Some(ColumnType::Float),
            Self::String(_) => Some(ColumnType::String),
            Self::Date(_) => Some(ColumnType::Date),
            Self::DateTime(_) => Some(ColumnType::DateTime),
            Self::Code(_) => Some(ColumnType::Code),
        }
    }

    /// Check for the null marker
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Construct a date value, if the components form a real date
    pub fn date(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self::Date)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            Self::Code(c) => write!(f, "{c}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_of() {
        assert_eq!(Value::Integer(1).type_of(), Some(ColumnType::Integer));
        assert_eq!(Value::Null.type_of(), None);
        assert_eq!(
            Value::date(2021, 8, 3).unwrap().type_of(),
            Some(ColumnType::Date)
        );
    }

    #[test]
    fn test_invalid_date_rejected() {
        assert!(Value::date(2021, 2, 30).is_none());
    }

    #[test]
    fn test_option_conversion_uses_null() {
        let v: Value = Option::<i64>::None.into();
        assert!(v.is_null());
        let v: Value = Some(3i64).into();
        assert_eq!(v, Value::Integer(3));
    }
}
