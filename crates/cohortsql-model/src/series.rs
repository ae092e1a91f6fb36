//! Series nodes: typed columns derived from frames

use crate::Frame;
use cohortsql_types::Value;
use std::fmt;
use std::sync::Arc;

/// Unary series operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Boolean negation
    Not,
    /// Arithmetic negation
    Negate,
    /// Null test
    IsNull,
    /// Non-null test
    IsNotNull,
}

impl UnaryOp {
    /// Lower-case operator name used in node identities
    pub fn name(&self) -> &'static str {
        match self {
            Self::Not => "not",
            Self::Negate => "negate",
            Self::IsNull => "is_null",
            Self::IsNotNull => "is_not_null",
        }
    }
}

/// Binary series operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    /// True for the arithmetic operators
    pub fn is_arithmetic(&self) -> bool {
        matches!(self, Self::Add | Self::Subtract | Self::Multiply | Self::Divide)
    }

    /// True for every comparison operator, including equality
    pub fn is_comparison(&self) -> bool {
        matches!(self, Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge)
    }

    /// True for the ordering comparisons (excludes equality)
    pub fn is_ordering(&self) -> bool {
        matches!(self, Self::Lt | Self::Le | Self::Gt | Self::Ge)
    }

    /// True for the boolean connectives
    pub fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    /// Lower-case operator name used in node identities
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

/// A single typed column derived from a frame
///
/// Series nodes are the expression layer of the query model: column
/// selectors, constants, operators over other series, and patient-level
/// aggregations over event frames.
#[derive(Debug)]
pub enum Series {
    /// Column selected from a frame
    Column(ColumnSelect),
    /// Constant value
    Constant(Value),
    /// Unary operation
    Unary(UnarySeries),
    /// Binary operation
    Binary(BinarySeries),
    /// Number of event rows per patient
    Count(FrameAggregation),
    /// Whether any event row exists per patient
    Exists(FrameAggregation),
    /// First matching condition selects the result value
    Categorise(CategoriseSeries),
}

/// A column selector
#[derive(Debug)]
pub struct ColumnSelect {
    /// The frame the column is drawn from
    pub frame: Arc<Frame>,
    /// Column name, resolved against the frame's schema
    pub name: String,
}

/// A unary operation over a series
#[derive(Debug)]
pub struct UnarySeries {
    pub op: UnaryOp,
    pub operand: Arc<Series>,
}

/// A binary operation over two series
#[derive(Debug)]
pub struct BinarySeries {
    pub op: BinaryOp,
    pub lhs: Arc<Series>,
    pub rhs: Arc<Series>,
}

/// A patient-level aggregation over an event frame
#[derive(Debug)]
pub struct FrameAggregation {
    /// The event frame being aggregated
    pub frame: Arc<Frame>,
}

/// A condition-map categorisation
///
/// Conditions are tested in order; the first true condition selects its
/// value, and `default` (or null) applies when none match.
#[derive(Debug)]
pub struct CategoriseSeries {
    /// (condition, result value) pairs, in priority order
    pub cases: Vec<(Arc<Series>, Value)>,
    /// Value when no condition matches
    pub default: Option<Value>,
}

impl Series {
    /// Select a column from a frame
    pub fn column(frame: &Arc<Frame>, name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::Column(ColumnSelect {
            frame: Arc::clone(frame),
            name: name.into(),
        }))
    }

    /// A constant series
    pub fn constant(value: Value) -> Arc<Self> {
        Arc::new(Self::Constant(value))
    }

    /// A unary operation
    pub fn unary(op: UnaryOp, operand: &Arc<Series>) -> Arc<Self> {
        Arc::new(Self::Unary(UnarySeries {
            op,
            operand: Arc::clone(operand),
        }))
    }

    /// A binary operation
    pub fn binary(op: BinaryOp, lhs: &Arc<Series>, rhs: &Arc<Series>) -> Arc<Self> {
        Arc::new(Self::Binary(BinarySeries {
            op,
            lhs: Arc::clone(lhs),
            rhs: Arc::clone(rhs),
        }))
    }

    /// Count event rows per patient
    pub fn count(frame: &Arc<Frame>) -> Arc<Self> {
        Arc::new(Self::Count(FrameAggregation {
            frame: Arc::clone(frame),
        }))
    }

    /// Test whether any event row exists per patient
    pub fn exists(frame: &Arc<Frame>) -> Arc<Self> {
        Arc::new(Self::Exists(FrameAggregation {
            frame: Arc::clone(frame),
        }))
    }

    /// Categorise by an ordered condition map
    pub fn categorise(
        cases: impl IntoIterator<Item = (Arc<Series>, Value)>,
        default: Option<Value>,
    ) -> Arc<Self> {
        Arc::new(Self::Categorise(CategoriseSeries {
            cases: cases.into_iter().collect(),
            default,
        }))
    }

    /// Render a stable identity for error reports
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

// Operator convenience constructors, used by definition authors and tests
impl Series {
    pub fn eq(lhs: &Arc<Series>, rhs: &Arc<Series>) -> Arc<Self> {
        Self::binary(BinaryOp::Eq, lhs, rhs)
    }

    pub fn ne(lhs: &Arc<Series>, rhs: &Arc<Series>) -> Arc<Self> {
        Self::binary(BinaryOp::Ne, lhs, rhs)
    }

    pub fn lt(lhs: &Arc<Series>, rhs: &Arc<Series>) -> Arc<Self> {
        Self::binary(BinaryOp::Lt, lhs, rhs)
    }

    pub fn le(lhs: &Arc<Series>, rhs: &Arc<Series>) -> Arc<Self> {
        Self::binary(BinaryOp::Le, lhs, rhs)
    }

    pub fn gt(lhs: &Arc<Series>, rhs: &Arc<Series>) -> Arc<Self> {
        Self::binary(BinaryOp::Gt, lhs, rhs)
    }

    pub fn ge(lhs: &Arc<Series>, rhs: &Arc<Series>) -> Arc<Self> {
        Self::binary(BinaryOp::Ge, lhs, rhs)
    }

    pub fn add(lhs: &Arc<Series>, rhs: &Arc<Series>) -> Arc<Self> {
        Self::binary(BinaryOp::Add, lhs, rhs)
    }

    pub fn subtract(lhs: &Arc<Series>, rhs: &Arc<Series>) -> Arc<Self> {
        Self::binary(BinaryOp::Subtract, lhs, rhs)
    }

    pub fn and(lhs: &Arc<Series>, rhs: &Arc<Series>) -> Arc<Self> {
        Self::binary(BinaryOp::And, lhs, rhs)
    }

    pub fn or(lhs: &Arc<Series>, rhs: &Arc<Series>) -> Arc<Self> {
        Self::binary(BinaryOp::Or, lhs, rhs)
    }

    pub fn not(operand: &Arc<Series>) -> Arc<Self> {
        Self::unary(UnaryOp::Not, operand)
    }

    pub fn is_null(operand: &Arc<Series>) -> Arc<Self> {
        Self::unary(UnaryOp::IsNull, operand)
    }

    pub fn is_not_null(operand: &Arc<Series>) -> Arc<Self> {
        Self::unary(UnaryOp::IsNotNull, operand)
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(c) => write!(f, "{}.{}", c.frame.table_name(), c.name),
            Self::Constant(v) => write!(f, "{v}"),
            Self::Unary(u) => write!(f, "{}({})", u.op.name(), u.operand),
            Self::Binary(b) => write!(f, "{}({}, {})", b.op.name(), b.lhs, b.rhs),
            Self::Count(a) => write!(f, "count({})", a.frame),
            Self::Exists(a) => write!(f, "exists({})", a.frame),
            Self::Categorise(c) => write!(f, "categorise({} cases)", c.cases.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cohortsql_types::{ColumnType, TableSchema};

    #[test]
    fn test_describe_renders_identity() {
        let events = Frame::event_table(
            "events",
            TableSchema::from_primitives("events", [("code", ColumnType::Code)]),
        );
        let series = Series::eq(
            &events.select("code"),
            &Series::constant(Value::Code("E119".into())),
        );
        assert_eq!(series.describe(), "eq(events.code, E119)");
    }

    #[test]
    fn test_operator_classification() {
        assert!(BinaryOp::Add.is_arithmetic());
        assert!(BinaryOp::Lt.is_ordering());
        assert!(BinaryOp::Eq.is_comparison());
        assert!(!BinaryOp::Eq.is_ordering());
        assert!(BinaryOp::And.is_logical());
    }
}
