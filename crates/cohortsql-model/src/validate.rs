//! Query-model validation and type inference
//!
//! A single memoized walk over the dataset's DAG that:
//! - resolves every column leaf against its table schema
//! - computes every node's result type from its operands' types
//! - enforces the frame-dimension rules (event-level series combine only
//!   within one frame chain; output columns are patient-level)
//!
//! All of this runs before any SQL is compiled; shared sub-expressions are
//! checked once and their results reused by pointer identity.

use crate::{
    BinaryOp, BinarySeries, CategoriseSeries, Dataset, Frame, FrameDimension, Series, UnaryOp,
    UnarySeries,
};
use cohortsql_diagnostics::{CSQ0106, CSQ0107, CSQ0108, CSQ0109, ExtractError, Result};
use cohortsql_types::{ColumnType, Value};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// How a series relates to patients
#[derive(Debug, Clone)]
pub enum SeriesDimension {
    /// No frame dependency; combines with anything
    Constant,
    /// One value per patient; distinct patient-level sources may be
    /// combined (the compiler joins them on the patient identifier)
    Patient,
    /// One value per event row of the carried frame chain
    Event(Arc<Frame>),
}

/// Inferred facts about a series node
#[derive(Debug, Clone)]
pub struct SeriesInfo {
    /// Result type; `None` for the null constant
    pub column_type: Option<ColumnType>,
    /// Patient relationship
    pub dimension: SeriesDimension,
}

/// A dataset that passed validation, carrying the inferred node types
///
/// The compiler consults this for literal formatting (a constant's target
/// type is its counterpart operand's inferred type) instead of re-deriving
/// types during code generation.
#[derive(Debug)]
pub struct ValidatedDataset {
    series_types: HashMap<usize, Option<ColumnType>>,
    column_types: IndexMap<String, Option<ColumnType>>,
}

impl ValidatedDataset {
    /// The inferred type of a node, by pointer identity
    ///
    /// Outer `None` means the node was not reachable from the validated
    /// dataset; inner `None` is the null constant.
    pub fn series_type(&self, series: &Arc<Series>) -> Option<Option<ColumnType>> {
        self.series_types.get(&series_key(series)).copied()
    }

    /// Output column types in declaration order
    pub fn output_columns(&self) -> impl Iterator<Item = (&str, Option<ColumnType>)> {
        self.column_types.iter().map(|(n, t)| (n.as_str(), *t))
    }
}

fn series_key(series: &Arc<Series>) -> usize {
    Arc::as_ptr(series) as usize
}

fn frame_key(frame: &Arc<Frame>) -> usize {
    Arc::as_ptr(frame) as usize
}

/// True when `candidate` is `frame` or appears in its source chain
fn in_chain(candidate: &Arc<Frame>, frame: &Arc<Frame>) -> bool {
    let mut current = Arc::clone(frame);
    loop {
        if Arc::ptr_eq(candidate, &current) {
            return true;
        }
        let next = match current.as_ref() {
            Frame::Filter(f) => Arc::clone(&f.source),
            Frame::PickOne(p) => Arc::clone(&p.source),
            Frame::PatientTable(_) | Frame::EventTable(_) => return false,
        };
        current = next;
    }
}

/// Validate a dataset definition against the schemas its leaves reference
pub fn validate_dataset(dataset: &Dataset) -> Result<ValidatedDataset> {
    let mut validator = Validator::default();
    let mut column_types = IndexMap::new();

    for (name, series) in dataset.columns() {
        let info = validator.check_series(series)?;
        if let SeriesDimension::Event(_) = info.dimension {
            return Err(ExtractError::dimension_violation(
                format!("output column '{name}' is event-level; reduce it to patient level"),
                series.describe(),
            ));
        }
        column_types.insert(name.to_string(), info.column_type);
    }

    if let Some(population) = dataset.population() {
        let info = validator.check_series(population)?;
        if info.column_type != Some(ColumnType::Boolean) {
            return Err(ExtractError::non_boolean_predicate(
                describe_type(info.column_type),
                population.describe(),
            ));
        }
        if !matches!(info.dimension, SeriesDimension::Patient) {
            return Err(ExtractError::dimension_violation(
                "population predicate must be patient-level",
                population.describe(),
            ));
        }
    }

    Ok(ValidatedDataset {
        series_types: validator.series_types,
        column_types,
    })
}

fn string_constant(series: &Arc<Series>) -> bool {
    matches!(series.as_ref(), Series::Constant(Value::String(_)))
}

fn describe_type(ty: Option<ColumnType>) -> String {
    match ty {
        Some(t) => t.to_string(),
        None => "null".to_string(),
    }
}

#[derive(Default)]
struct Validator {
    series_types: HashMap<usize, Option<ColumnType>>,
    series_dims: HashMap<usize, SeriesDimension>,
    frames_checked: HashSet<usize>,
}

impl Validator {
    fn check_series(&mut self, series: &Arc<Series>) -> Result<SeriesInfo> {
        let key = series_key(series);
        if let Some(ty) = self.series_types.get(&key) {
            let dimension = self.series_dims[&key].clone();
            return Ok(SeriesInfo {
                column_type: *ty,
                dimension,
            });
        }

        let info = match series.as_ref() {
            Series::Column(select) => {
                self.check_frame(&select.frame)?;
                let column_type = select.frame.schema().get_column_type(&select.name)?;
                let dimension = match select.frame.dimension() {
                    FrameDimension::Patient => SeriesDimension::Patient,
                    FrameDimension::Event => SeriesDimension::Event(Arc::clone(&select.frame)),
                };
                SeriesInfo {
                    column_type: Some(column_type),
                    dimension,
                }
            }
            Series::Constant(value) => SeriesInfo {
                column_type: value.type_of(),
                dimension: SeriesDimension::Constant,
            },
            Series::Unary(unary) => self.check_unary(series, unary)?,
            Series::Binary(binary) => self.check_binary(series, binary)?,
            Series::Count(agg) => {
                self.check_aggregated_frame(series, &agg.frame)?;
                SeriesInfo {
                    column_type: Some(ColumnType::Integer),
                    dimension: SeriesDimension::Patient,
                }
            }
            Series::Exists(agg) => {
                self.check_aggregated_frame(series, &agg.frame)?;
                SeriesInfo {
                    column_type: Some(ColumnType::Boolean),
                    dimension: SeriesDimension::Patient,
                }
            }
            Series::Categorise(cat) => self.check_categorise(series, cat)?,
        };

        self.series_types.insert(key, info.column_type);
        self.series_dims.insert(key, info.dimension.clone());
        Ok(info)
    }

    fn check_unary(&mut self, node: &Arc<Series>, unary: &UnarySeries) -> Result<SeriesInfo> {
        let operand = self.check_series(&unary.operand)?;
        let column_type = match unary.op {
            UnaryOp::Not => {
                if !matches!(operand.column_type, Some(ColumnType::Boolean) | None) {
                    return Err(ExtractError::type_mismatch(
                        "boolean",
                        describe_type(operand.column_type),
                        node.describe(),
                    ));
                }
                Some(ColumnType::Boolean)
            }
            UnaryOp::Negate => match operand.column_type {
                Some(t) if t.is_numeric() => Some(t),
                other => {
                    return Err(ExtractError::type_mismatch(
                        "numeric",
                        describe_type(other),
                        node.describe(),
                    ));
                }
            },
            UnaryOp::IsNull | UnaryOp::IsNotNull => Some(ColumnType::Boolean),
        };
        Ok(SeriesInfo {
            column_type,
            dimension: operand.dimension,
        })
    }

    fn check_binary(&mut self, node: &Arc<Series>, binary: &BinarySeries) -> Result<SeriesInfo> {
        let lhs = self.check_series(&binary.lhs)?;
        let rhs = self.check_series(&binary.rhs)?;
        let dimension = self.combine_dimensions(node, &lhs.dimension, &rhs.dimension)?;

        let column_type = if binary.op.is_arithmetic() {
            self.arithmetic_type(node, binary.op, lhs.column_type, rhs.column_type)?
        } else if binary.op.is_comparison() {
            self.comparison_type(node, binary, &lhs, &rhs)?
        } else {
            // Logical connectives
            for ty in [lhs.column_type, rhs.column_type] {
                if !matches!(ty, Some(ColumnType::Boolean) | None) {
                    return Err(ExtractError::type_mismatch(
                        "boolean",
                        describe_type(ty),
                        node.describe(),
                    ));
                }
            }
            Some(ColumnType::Boolean)
        };

        Ok(SeriesInfo {
            column_type,
            dimension,
        })
    }

    fn arithmetic_type(
        &self,
        node: &Arc<Series>,
        op: BinaryOp,
        lhs: Option<ColumnType>,
        rhs: Option<ColumnType>,
    ) -> Result<Option<ColumnType>> {
        let operand = match (lhs, rhs) {
            (Some(l), Some(r)) => {
                if !l.is_numeric() || !r.is_numeric() {
                    return Err(ExtractError::incompatible_operands(
                        op.name(),
                        l.to_string(),
                        r.to_string(),
                        node.describe(),
                    ));
                }
                if l == ColumnType::Float || r == ColumnType::Float {
                    ColumnType::Float
                } else {
                    ColumnType::Integer
                }
            }
            // Null propagates; the result keeps the non-null side's type
            (Some(t), None) | (None, Some(t)) if t.is_numeric() => t,
            (l, r) => {
                return Err(ExtractError::incompatible_operands(
                    op.name(),
                    describe_type(l),
                    describe_type(r),
                    node.describe(),
                ));
            }
        };
        // Division always yields a float, even over integers
        let result = if op == BinaryOp::Divide {
            ColumnType::Float
        } else {
            operand
        };
        Ok(Some(result))
    }

    fn comparison_type(
        &self,
        node: &Arc<Series>,
        binary: &BinarySeries,
        lhs: &SeriesInfo,
        rhs: &SeriesInfo,
    ) -> Result<Option<ColumnType>> {
        match (lhs.column_type, rhs.column_type) {
            (Some(l), Some(r)) => {
                // String constants may stand in for date/datetime/code
                // literals; the dialect enforces their strict format when
                // the comparison is compiled
                let literal_stand_in = (string_constant(&binary.rhs)
                    && (l.is_temporal() || l == ColumnType::Code))
                    || (string_constant(&binary.lhs)
                        && (r.is_temporal() || r == ColumnType::Code));
                if !l.is_comparable_with(&r) && !literal_stand_in {
                    return Err(ExtractError::incompatible_operands(
                        binary.op.name(),
                        l.to_string(),
                        r.to_string(),
                        node.describe(),
                    ));
                }
                if binary.op.is_ordering() && (!l.is_orderable() || !r.is_orderable()) {
                    return Err(ExtractError::incompatible_operands(
                        binary.op.name(),
                        l.to_string(),
                        r.to_string(),
                        node.describe(),
                    ));
                }
                self.check_category_membership(node, binary)?;
            }
            // Equality against null compiles to an IS NULL test
            (None, _) | (_, None) => {
                if binary.op.is_ordering() {
                    return Err(ExtractError::incompatible_operands(
                        binary.op.name(),
                        describe_type(lhs.column_type),
                        describe_type(rhs.column_type),
                        node.describe(),
                    ));
                }
            }
        }
        Ok(Some(ColumnType::Boolean))
    }

    /// Equality against a categorical column must stay inside its categories
    fn check_category_membership(&self, node: &Arc<Series>, binary: &BinarySeries) -> Result<()> {
        if !matches!(binary.op, BinaryOp::Eq | BinaryOp::Ne) {
            return Ok(());
        }
        let pairs = [(&binary.lhs, &binary.rhs), (&binary.rhs, &binary.lhs)];
        for (column_side, constant_side) in pairs {
            let (Series::Column(select), Series::Constant(value)) =
                (column_side.as_ref(), constant_side.as_ref())
            else {
                continue;
            };
            let column = select.frame.schema().get_column(&select.name)?;
            let rendered = match value {
                Value::String(s) | Value::Code(s) => s.as_str(),
                _ => continue,
            };
            if !column.accepts_category(rendered) {
                return Err(ExtractError::outside_categories(
                    format!("{value}"),
                    node.describe(),
                ));
            }
        }
        Ok(())
    }

    fn combine_dimensions(
        &self,
        node: &Arc<Series>,
        lhs: &SeriesDimension,
        rhs: &SeriesDimension,
    ) -> Result<SeriesDimension> {
        match (lhs, rhs) {
            (SeriesDimension::Constant, other) | (other, SeriesDimension::Constant) => {
                Ok(other.clone())
            }
            (SeriesDimension::Patient, SeriesDimension::Patient) => Ok(SeriesDimension::Patient),
            (SeriesDimension::Event(l), SeriesDimension::Event(r)) => {
                if in_chain(l, r) || in_chain(r, l) {
                    Ok(SeriesDimension::Event(Arc::clone(l)))
                } else {
                    Err(ExtractError::dimension_violation(
                        "series from different event frames cannot be combined directly",
                        node.describe(),
                    ))
                }
            }
            (SeriesDimension::Patient, SeriesDimension::Event(_))
            | (SeriesDimension::Event(_), SeriesDimension::Patient) => {
                Err(ExtractError::dimension_violation(
                    "patient-level and event-level series cannot be combined directly",
                    node.describe(),
                ))
            }
        }
    }

    fn check_aggregated_frame(&mut self, node: &Arc<Series>, frame: &Arc<Frame>) -> Result<()> {
        self.check_frame(frame)?;
        if frame.dimension() != FrameDimension::Event {
            return Err(ExtractError::query_model(
                CSQ0107,
                "aggregation requires an event frame",
                node.describe(),
            ));
        }
        Ok(())
    }

    fn check_categorise(
        &mut self,
        node: &Arc<Series>,
        cat: &CategoriseSeries,
    ) -> Result<SeriesInfo> {
        let mut dimension = SeriesDimension::Constant;
        for (condition, _) in &cat.cases {
            let info = self.check_series(condition)?;
            if info.column_type != Some(ColumnType::Boolean) {
                return Err(ExtractError::non_boolean_predicate(
                    describe_type(info.column_type),
                    condition.describe(),
                ));
            }
            dimension = self.combine_dimensions(node, &dimension, &info.dimension)?;
        }

        // All case values and the default must share one type
        let mut result_type: Option<ColumnType> = None;
        let values = cat
            .cases
            .iter()
            .map(|(_, v)| v)
            .chain(cat.default.as_ref());
        for value in values {
            let Some(ty) = value.type_of() else { continue };
            match result_type {
                None => result_type = Some(ty),
                Some(existing) if existing == ty => {}
                Some(existing) => {
                    return Err(ExtractError::query_model(
                        CSQ0106,
                        format!("category values mix {existing} and {ty}"),
                        node.describe(),
                    ));
                }
            }
        }

        Ok(SeriesInfo {
            column_type: result_type,
            dimension,
        })
    }

    fn check_frame(&mut self, frame: &Arc<Frame>) -> Result<()> {
        let key = frame_key(frame);
        if self.frames_checked.contains(&key) {
            return Ok(());
        }

        match frame.as_ref() {
            Frame::PatientTable(_) | Frame::EventTable(_) => {}
            Frame::Filter(filter) => {
                self.check_frame(&filter.source)?;
                let info = self.check_series(&filter.predicate)?;
                if info.column_type != Some(ColumnType::Boolean) {
                    return Err(ExtractError::non_boolean_predicate(
                        describe_type(info.column_type),
                        filter.predicate.describe(),
                    ));
                }
                self.check_rooted_in(&filter.predicate, &filter.source)?;
            }
            Frame::PickOne(pick) => {
                self.check_frame(&pick.source)?;
                if pick.source.dimension() != FrameDimension::Event {
                    return Err(ExtractError::query_model(
                        CSQ0107,
                        "sort-and-pick requires an event frame",
                        frame.to_string(),
                    ));
                }
                if pick.sort_by.is_empty() {
                    return Err(ExtractError::query_model(
                        CSQ0108,
                        "sort-and-pick requires at least one sort key",
                        frame.to_string(),
                    ));
                }
                for key_series in &pick.sort_by {
                    let info = self.check_series(key_series)?;
                    match info.column_type {
                        Some(t) if t.is_orderable() => {}
                        other => {
                            return Err(ExtractError::query_model(
                                CSQ0108,
                                format!("sort key of type {} is not orderable", describe_type(other)),
                                key_series.describe(),
                            ));
                        }
                    }
                    self.check_rooted_in(key_series, &pick.source)?;
                }
            }
        }

        self.frames_checked.insert(key);
        Ok(())
    }

    /// Every column reference in `series` must come from `frame`'s chain,
    /// and aggregations may not appear at all: predicates and sort keys are
    /// compiled row-wise inside the frame's own statement.
    fn check_rooted_in(&self, series: &Arc<Series>, frame: &Arc<Frame>) -> Result<()> {
        match series.as_ref() {
            Series::Column(select) => {
                if !in_chain(&select.frame, frame) && !in_chain(frame, &select.frame) {
                    return Err(ExtractError::query_model(
                        CSQ0109,
                        format!("column is drawn from {}, not the filtered frame", select.frame),
                        series.describe(),
                    ));
                }
                Ok(())
            }
            Series::Constant(_) => Ok(()),
            Series::Unary(u) => self.check_rooted_in(&u.operand, frame),
            Series::Binary(b) => {
                self.check_rooted_in(&b.lhs, frame)?;
                self.check_rooted_in(&b.rhs, frame)
            }
            Series::Count(_) | Series::Exists(_) => Err(ExtractError::query_model(
                CSQ0109,
                "aggregations cannot appear inside predicates or sort keys",
                series.describe(),
            )),
            Series::Categorise(cat) => {
                for (condition, _) in &cat.cases {
                    self.check_rooted_in(condition, frame)?;
                }
                Ok(())
            }
        }
    }
}
