//! Deterministic SQL compilation of validated datasets
//!
//! One walk over the query-model DAG produces a CTE-structured statement
//! per batch:
//! - derived frames become CTEs named `frame_1..n`, aggregations become
//!   CTEs named `agg_1..n`, join aliases are `t_1..n`; all three are
//!   numbered in order of first use, never by hash order, so compiling
//!   the same definitions twice yields byte-identical SQL
//! - shared sub-expressions are compiled once and referenced by pointer
//!   identity
//! - the patient universe is the distinct union of patient identifiers
//!   over every referenced base table, narrowed by the population
//!   predicate when one is set
//! - each batch left-joins its patient-level intermediates to the
//!   universe and orders by patient identifier

use crate::split_into_batches;
use cohortsql_diagnostics::{CSQ0100, CSQ0109, ExtractError, Result};
use cohortsql_dialect::SqlDialect;
use cohortsql_model::{
    BinaryOp, BinarySeries, CategoriseSeries, Dataset, Frame, PickPosition, Series, UnaryOp,
    ValidatedDataset,
};
use cohortsql_types::{ColumnType, PATIENT_ID_COLUMN, TableSchema, Value};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// A compiled dataset: one statement per batch, plus the base tables the
/// definitions reference (used to cross-check the backend descriptor
/// before anything is submitted)
#[derive(Debug, Clone)]
pub struct CompiledDataset {
    /// Output column names, in dataset order
    pub column_names: Vec<String>,
    /// Independent statements; their results are combined by an outer
    /// join on the patient identifier
    pub batches: Vec<CompiledBatch>,
    /// Base tables referenced anywhere in the definitions
    pub base_tables: IndexMap<String, TableSchema>,
}

/// One batch: a complete statement carrying a subset of the output columns
#[derive(Debug, Clone)]
pub struct CompiledBatch {
    /// The statement text
    pub sql: String,
    /// Output columns this batch projects, in dataset order; the patient
    /// identifier is always projected first and is not listed here
    pub columns: Vec<String>,
}

/// Compile a validated dataset for a dialect
///
/// `batch_size` bounds the number of join groups per statement; `None`
/// compiles everything into a single statement.
pub fn compile_dataset(
    dataset: &Dataset,
    validated: &ValidatedDataset,
    dialect: &dyn SqlDialect,
    batch_size: Option<usize>,
) -> Result<CompiledDataset> {
    let mut compiler = Compiler::new(dialect, validated);

    // Compile every output column, tracking which join sources it uses
    let mut columns = Vec::new();
    for (name, series) in dataset.columns() {
        compiler.current_sources.clear();
        let expr = compiler.expr(series, Scope::Patient)?;
        columns.push(CompiledColumn {
            name: name.to_string(),
            expr,
            sources: compiler.take_sources(),
        });
    }

    let population = match dataset.population() {
        Some(predicate) => {
            compiler.current_sources.clear();
            let expr = compiler.expr(predicate, Scope::Patient)?;
            Some((expr, compiler.take_sources()))
        }
        None => None,
    };

    if compiler.base_tables.is_empty() {
        return Err(ExtractError::query_model(
            CSQ0100,
            "dataset must reference at least one table",
            "dataset",
        ));
    }

    // Columns sharing a source signature always travel together, so a
    // single intermediate's columns are never split across batches
    let mut groups: IndexMap<Vec<usize>, Vec<usize>> = IndexMap::new();
    for (index, column) in columns.iter().enumerate() {
        groups.entry(column.sources.clone()).or_default().push(index);
    }
    let group_list: Vec<(Vec<usize>, Vec<usize>)> = groups.into_iter().collect();
    let batched_groups: Vec<Vec<(Vec<usize>, Vec<usize>)>> = if group_list.is_empty() {
        vec![Vec::new()]
    } else {
        split_into_batches(group_list, batch_size)?.collect()
    };

    let mut batches = Vec::new();
    for group_batch in &batched_groups {
        batches.push(compiler.emit_batch(group_batch, &columns, population.as_ref())?);
    }

    log::debug!(
        "compiled {} column(s) into {} batch(es) for {}",
        columns.len(),
        batches.len(),
        dialect.name()
    );

    Ok(CompiledDataset {
        column_names: columns.into_iter().map(|c| c.name).collect(),
        batches,
        base_tables: compiler.base_tables,
    })
}

struct CompiledColumn {
    name: String,
    expr: String,
    sources: Vec<usize>,
}

/// Where an expression is rendered
#[derive(Clone, Copy, PartialEq)]
enum Scope {
    /// Inside a frame's own statement; columns are unqualified
    Row,
    /// In the final patient-level select; columns go through join aliases
    Patient,
}

struct Cte {
    name: String,
    body: String,
    /// Indices of CTEs this body references directly
    deps: Vec<usize>,
}

#[derive(Clone)]
enum JoinTarget {
    BaseTable(String),
    Cte(usize),
}

#[derive(Clone)]
struct JoinSource {
    alias: String,
    target: JoinTarget,
}

struct Compiler<'a> {
    dialect: &'a dyn SqlDialect,
    validated: &'a ValidatedDataset,
    ctes: Vec<Cte>,
    frame_ctes: HashMap<usize, usize>,
    agg_ctes: HashMap<usize, usize>,
    frame_counter: usize,
    agg_counter: usize,
    sources: IndexMap<usize, JoinSource>,
    alias_counter: usize,
    base_tables: IndexMap<String, TableSchema>,
    current_sources: Vec<usize>,
}

impl<'a> Compiler<'a> {
    fn new(dialect: &'a dyn SqlDialect, validated: &'a ValidatedDataset) -> Self {
        Self {
            dialect,
            validated,
            ctes: Vec::new(),
            frame_ctes: HashMap::new(),
            agg_ctes: HashMap::new(),
            frame_counter: 0,
            agg_counter: 0,
            sources: IndexMap::new(),
            alias_counter: 0,
            base_tables: IndexMap::new(),
            current_sources: Vec::new(),
        }
    }

    fn quote(&self, ident: &str) -> String {
        self.dialect.quote_identifier(ident)
    }

    fn pid(&self) -> String {
        self.quote(PATIENT_ID_COLUMN)
    }

    fn take_sources(&mut self) -> Vec<usize> {
        let mut seen = Vec::new();
        for key in self.current_sources.drain(..) {
            if !seen.contains(&key) {
                seen.push(key);
            }
        }
        seen
    }

    // === Frames ===

    /// A FROM-able reference to a frame, plus the CTE it points at (if any)
    fn frame_ref(&mut self, frame: &Arc<Frame>) -> Result<(String, Vec<usize>)> {
        match frame.as_ref() {
            Frame::PatientTable(table) | Frame::EventTable(table) => {
                self.base_tables
                    .entry(table.name.clone())
                    .or_insert_with(|| table.schema.clone());
                Ok((self.quote(&table.name), Vec::new()))
            }
            Frame::Filter(_) | Frame::PickOne(_) => {
                let index = self.frame_cte(frame)?;
                Ok((self.ctes[index].name.clone(), vec![index]))
            }
        }
    }

    fn frame_cte(&mut self, frame: &Arc<Frame>) -> Result<usize> {
        let key = Arc::as_ptr(frame) as usize;
        if let Some(index) = self.frame_ctes.get(&key) {
            return Ok(*index);
        }

        let (body, deps) = match frame.as_ref() {
            Frame::Filter(filter) => {
                let (source_ref, deps) = self.frame_ref(&filter.source)?;
                let predicate = self.expr(&filter.predicate, Scope::Row)?;
                (
                    format!("SELECT * FROM {source_ref} WHERE {predicate}"),
                    deps,
                )
            }
            Frame::PickOne(pick) => {
                let (source_ref, deps) = self.frame_ref(&pick.source)?;
                let direction = match pick.position {
                    PickPosition::First => "ASC",
                    PickPosition::Last => "DESC",
                };
                let mut keys = Vec::new();
                for key_series in &pick.sort_by {
                    let rendered = self.expr(key_series, Scope::Row)?;
                    keys.push(format!("{rendered} {direction}"));
                }
                let columns: Vec<String> = frame
                    .schema()
                    .column_names()
                    .map(|c| self.quote(c))
                    .collect();
                let body = format!(
                    "SELECT {cols} FROM (SELECT *, ROW_NUMBER() OVER (PARTITION BY {pid} ORDER BY {keys}) AS rn FROM {source_ref}) AS ranked WHERE rn = 1",
                    cols = columns.join(", "),
                    pid = self.pid(),
                    keys = keys.join(", "),
                );
                (body, deps)
            }
            Frame::PatientTable(_) | Frame::EventTable(_) => {
                unreachable!("base tables are referenced directly, not as CTEs")
            }
        };

        self.frame_counter += 1;
        let name = format!("frame_{}", self.frame_counter);
        self.ctes.push(Cte { name, body, deps });
        let index = self.ctes.len() - 1;
        self.frame_ctes.insert(key, index);
        Ok(index)
    }

    fn agg_cte(&mut self, series: &Arc<Series>, frame: &Arc<Frame>, count: bool) -> Result<usize> {
        let key = Arc::as_ptr(series) as usize;
        if let Some(index) = self.agg_ctes.get(&key) {
            return Ok(*index);
        }

        let (source_ref, deps) = self.frame_ref(frame)?;
        let pid = self.pid();
        let body = if count {
            format!("SELECT {pid}, COUNT(*) AS value FROM {source_ref} GROUP BY {pid}")
        } else {
            let truthy = self
                .dialect
                .format_literal(&Value::Boolean(true), ColumnType::Boolean)?;
            format!("SELECT {pid}, {truthy} AS value FROM {source_ref} GROUP BY {pid}")
        };

        self.agg_counter += 1;
        let name = format!("agg_{}", self.agg_counter);
        self.ctes.push(Cte { name, body, deps });
        let index = self.ctes.len() - 1;
        self.agg_ctes.insert(key, index);
        Ok(index)
    }

    // === Join sources ===

    fn join_frame(&mut self, frame: &Arc<Frame>) -> Result<String> {
        let key = Arc::as_ptr(frame) as usize;
        if let Some(source) = self.sources.get(&key) {
            let alias = source.alias.clone();
            self.current_sources.push(key);
            return Ok(alias);
        }

        let target = match frame.as_ref() {
            Frame::PatientTable(table) => {
                self.base_tables
                    .entry(table.name.clone())
                    .or_insert_with(|| table.schema.clone());
                JoinTarget::BaseTable(table.name.clone())
            }
            _ => JoinTarget::Cte(self.frame_cte(frame)?),
        };

        self.alias_counter += 1;
        let alias = format!("t_{}", self.alias_counter);
        self.sources.insert(
            key,
            JoinSource {
                alias: alias.clone(),
                target,
            },
        );
        self.current_sources.push(key);
        Ok(alias)
    }

    fn join_agg(&mut self, series: &Arc<Series>, frame: &Arc<Frame>, count: bool) -> Result<String> {
        let key = Arc::as_ptr(series) as usize;
        if let Some(source) = self.sources.get(&key) {
            let alias = source.alias.clone();
            self.current_sources.push(key);
            return Ok(alias);
        }

        let target = JoinTarget::Cte(self.agg_cte(series, frame, count)?);
        self.alias_counter += 1;
        let alias = format!("t_{}", self.alias_counter);
        self.sources.insert(
            key,
            JoinSource {
                alias: alias.clone(),
                target,
            },
        );
        self.current_sources.push(key);
        Ok(alias)
    }

    // === Expressions ===

    fn expr(&mut self, series: &Arc<Series>, scope: Scope) -> Result<String> {
        match series.as_ref() {
            Series::Column(select) => match scope {
                Scope::Row => Ok(self.quote(&select.name)),
                Scope::Patient => {
                    let alias = self.join_frame(&select.frame)?;
                    Ok(format!("{alias}.{}", self.quote(&select.name)))
                }
            },
            Series::Constant(value) => self.constant_sql(value, None),
            Series::Unary(unary) => {
                let operand = self.expr(&unary.operand, scope)?;
                Ok(match unary.op {
                    UnaryOp::Not => format!("(NOT {operand})"),
                    UnaryOp::Negate => format!("(-{operand})"),
                    UnaryOp::IsNull => format!("({operand} IS NULL)"),
                    UnaryOp::IsNotNull => format!("({operand} IS NOT NULL)"),
                })
            }
            Series::Binary(binary) => self.binary_expr(binary, scope),
            Series::Count(agg) => {
                if scope == Scope::Row {
                    return Err(ExtractError::query_model(
                        CSQ0109,
                        "aggregations cannot appear inside predicates or sort keys",
                        series.describe(),
                    ));
                }
                let alias = self.join_agg(series, &agg.frame, true)?;
                Ok(format!("COALESCE({alias}.value, 0)"))
            }
            Series::Exists(agg) => {
                if scope == Scope::Row {
                    return Err(ExtractError::query_model(
                        CSQ0109,
                        "aggregations cannot appear inside predicates or sort keys",
                        series.describe(),
                    ));
                }
                let alias = self.join_agg(series, &agg.frame, false)?;
                let falsy = self
                    .dialect
                    .format_literal(&Value::Boolean(false), ColumnType::Boolean)?;
                Ok(format!("COALESCE({alias}.value, {falsy})"))
            }
            Series::Categorise(cat) => self.case_expr(series, cat, scope),
        }
    }

    fn binary_expr(&mut self, binary: &BinarySeries, scope: Scope) -> Result<String> {
        // Comparisons against the null constant render as IS [NOT] NULL,
        // never as `= NULL`
        if matches!(binary.op, BinaryOp::Eq | BinaryOp::Ne) {
            let negation = if binary.op == BinaryOp::Ne { "NOT " } else { "" };
            if is_null_constant(&binary.rhs) && !is_null_constant(&binary.lhs) {
                let lhs = self.operand(&binary.lhs, &binary.rhs, scope)?;
                return Ok(format!("({lhs} IS {negation}NULL)"));
            }
            if is_null_constant(&binary.lhs) {
                let rhs = self.operand(&binary.rhs, &binary.lhs, scope)?;
                return Ok(format!("({rhs} IS {negation}NULL)"));
            }
        }

        let lhs = self.operand(&binary.lhs, &binary.rhs, scope)?;
        let rhs = self.operand(&binary.rhs, &binary.lhs, scope)?;
        Ok(match binary.op {
            BinaryOp::Add => format!("({lhs} + {rhs})"),
            BinaryOp::Subtract => format!("({lhs} - {rhs})"),
            BinaryOp::Multiply => format!("({lhs} * {rhs})"),
            // Integer division differs per backend; cast to force float
            BinaryOp::Divide => format!(
                "(CAST({lhs} AS {float}) / {rhs})",
                float = self.dialect.sql_type(ColumnType::Float)
            ),
            BinaryOp::Eq => format!("({lhs} = {rhs})"),
            BinaryOp::Ne => format!("({lhs} <> {rhs})"),
            BinaryOp::Lt => format!("({lhs} < {rhs})"),
            BinaryOp::Le => format!("({lhs} <= {rhs})"),
            BinaryOp::Gt => format!("({lhs} > {rhs})"),
            BinaryOp::Ge => format!("({lhs} >= {rhs})"),
            BinaryOp::And => format!("({lhs} AND {rhs})"),
            BinaryOp::Or => format!("({lhs} OR {rhs})"),
        })
    }

    /// Compile one operand; constants take their format from the
    /// counterpart operand's inferred type
    fn operand(
        &mut self,
        operand: &Arc<Series>,
        counterpart: &Arc<Series>,
        scope: Scope,
    ) -> Result<String> {
        if let Series::Constant(value) = operand.as_ref() {
            let target = self.validated.series_type(counterpart).flatten();
            self.constant_sql(value, target)
        } else {
            self.expr(operand, scope)
        }
    }

    fn constant_sql(&self, value: &Value, target: Option<ColumnType>) -> Result<String> {
        if value.is_null() {
            return Ok("NULL".to_string());
        }
        match target.or_else(|| value.type_of()) {
            Some(target) => self.dialect.format_literal(value, target),
            None => Ok("NULL".to_string()),
        }
    }

    fn case_expr(
        &mut self,
        node: &Arc<Series>,
        cat: &CategoriseSeries,
        scope: Scope,
    ) -> Result<String> {
        let result_type = self.validated.series_type(node).flatten();
        let mut rendered = String::from("CASE");
        for (condition, value) in &cat.cases {
            let condition_sql = self.expr(condition, scope)?;
            let value_sql = self.constant_sql(value, result_type)?;
            rendered.push_str(&format!(" WHEN {condition_sql} THEN {value_sql}"));
        }
        if let Some(default) = &cat.default {
            let default_sql = self.constant_sql(default, result_type)?;
            rendered.push_str(&format!(" ELSE {default_sql}"));
        }
        rendered.push_str(" END");
        Ok(format!("({rendered})"))
    }

    // === Statement assembly ===

    fn universe_body(&self) -> String {
        let pid = self.pid();
        let tables: Vec<&String> = self.base_tables.keys().collect();
        match tables.as_slice() {
            [single] => format!("SELECT DISTINCT {pid} FROM {}", self.quote(single)),
            _ => tables
                .iter()
                .map(|table| format!("SELECT {pid} FROM {}", self.quote(table)))
                .collect::<Vec<_>>()
                .join(" UNION "),
        }
    }

    /// Transitive closure of CTEs needed by the given join sources, in
    /// definition order
    fn cte_closure(&self, source_keys: &[usize]) -> Vec<usize> {
        let mut needed = BTreeSet::new();
        let mut stack: Vec<usize> = source_keys
            .iter()
            .filter_map(|key| match &self.sources[key].target {
                JoinTarget::Cte(index) => Some(*index),
                JoinTarget::BaseTable(_) => None,
            })
            .collect();
        while let Some(index) = stack.pop() {
            if needed.insert(index) {
                stack.extend(&self.ctes[index].deps);
            }
        }
        needed.into_iter().collect()
    }

    fn emit_batch(
        &self,
        groups: &[(Vec<usize>, Vec<usize>)],
        columns: &[CompiledColumn],
        population: Option<&(String, Vec<usize>)>,
    ) -> Result<CompiledBatch> {
        // Sources for this batch: every group's sources plus the
        // population's, deduplicated in global first-use order
        let mut wanted: Vec<usize> = Vec::new();
        for (group_sources, _) in groups {
            wanted.extend(group_sources);
        }
        if let Some((_, population_sources)) = population {
            wanted.extend(population_sources);
        }
        let batch_sources: Vec<usize> = self
            .sources
            .keys()
            .filter(|key| wanted.contains(key))
            .copied()
            .collect();

        // Columns in dataset order
        let mut column_indices: Vec<usize> = groups
            .iter()
            .flat_map(|(_, indices)| indices.iter().copied())
            .collect();
        column_indices.sort_unstable();

        let pid = self.pid();
        let mut sql = String::from("WITH ");
        for index in self.cte_closure(&batch_sources) {
            let cte = &self.ctes[index];
            sql.push_str(&format!("{} AS ({}),\n", cte.name, cte.body));
        }
        sql.push_str(&format!("universe AS ({})\n", self.universe_body()));

        let mut select_items = vec![format!("universe.{pid}")];
        for &index in &column_indices {
            let column = &columns[index];
            select_items.push(format!("{} AS {}", column.expr, self.quote(&column.name)));
        }
        sql.push_str(&format!("SELECT {}\n", select_items.join(", ")));
        sql.push_str("FROM universe");

        for key in &batch_sources {
            let source = &self.sources[key];
            let target = match &source.target {
                JoinTarget::BaseTable(table) => self.quote(table),
                JoinTarget::Cte(index) => self.ctes[*index].name.clone(),
            };
            sql.push_str(&format!(
                "\nLEFT JOIN {target} AS {alias} ON {alias}.{pid} = universe.{pid}",
                alias = source.alias,
            ));
        }

        if let Some((population_expr, _)) = population {
            sql.push_str(&format!("\nWHERE {population_expr}"));
        }
        sql.push_str(&format!("\nORDER BY universe.{pid}"));

        Ok(CompiledBatch {
            sql,
            columns: column_indices
                .iter()
                .map(|&index| columns[index].name.clone())
                .collect(),
        })
    }
}

fn is_null_constant(series: &Arc<Series>) -> bool {
    matches!(series.as_ref(), Series::Constant(Value::Null))
}
