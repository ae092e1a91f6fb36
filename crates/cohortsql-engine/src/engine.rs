//! The engine contract and the concrete SQL engine
//!
//! `QueryEngine` pins the shared lifecycle: validate the query model,
//! compile it (batching when the fan-out exceeds the backend's limit),
//! run the statements, and combine batch results by an outer join on the
//! patient identifier, re-sorted so output ordering is reproducible.

use crate::{
    BackendDescriptor, CompiledBatch, CompiledDataset, QueryRunner, ResultRow, compile_dataset,
};
use async_trait::async_trait;
use cohortsql_diagnostics::{ExtractError, Result};
use cohortsql_dialect::{SqlDialect, dialect_for};
use cohortsql_model::{Dataset, validate_dataset};
use cohortsql_types::Value;
use futures::future::try_join_all;
use std::collections::{BTreeMap, HashMap};

/// The backend-agnostic engine contract
///
/// `execute` is the shared lifecycle and is provided; concrete engines
/// supply `compile` and `run`. All validation and compilation failures
/// surface before `run` opens a connection.
#[async_trait]
pub trait QueryEngine {
    /// The backend this engine targets
    fn backend(&self) -> &BackendDescriptor;

    /// Validate and compile a dataset into backend-native statements
    fn compile(&self, dataset: &Dataset) -> Result<CompiledDataset>;

    /// Execute compiled statements and combine their results
    async fn run(&self, compiled: &CompiledDataset) -> Result<Vec<ResultRow>>;

    /// Validate, compile, run, combine
    async fn execute(&self, dataset: &Dataset) -> Result<Vec<ResultRow>> {
        let compiled = self.compile(dataset)?;
        self.run(&compiled).await
    }
}

/// The concrete engine: compiles through a dialect adapter and executes
/// through any [`QueryRunner`]
pub struct SqlEngine<R> {
    backend: BackendDescriptor,
    dialect: Box<dyn SqlDialect>,
    runner: R,
    batch_size: Option<usize>,
}

impl<R> std::fmt::Debug for SqlEngine<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlEngine")
            .field("backend", &self.backend)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl<R: QueryRunner> SqlEngine<R> {
    /// Create an engine for a backend; the dialect is selected from the
    /// backend's logical name
    pub fn new(backend: BackendDescriptor, runner: R) -> Result<Self> {
        let dialect = dialect_for(backend.name())?;
        Ok(Self {
            backend,
            dialect,
            runner,
            batch_size: None,
        })
    }

    /// Override the dialect's join limit with an explicit batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// The active dialect adapter
    pub fn dialect(&self) -> &dyn SqlDialect {
        self.dialect.as_ref()
    }

    fn effective_batch_size(&self) -> Option<usize> {
        self.batch_size.or_else(|| self.dialect.max_joins_per_query())
    }
}

#[async_trait]
impl<R: QueryRunner> QueryEngine for SqlEngine<R> {
    fn backend(&self) -> &BackendDescriptor {
        &self.backend
    }

    fn compile(&self, dataset: &Dataset) -> Result<CompiledDataset> {
        let validated = validate_dataset(dataset)?;
        let compiled = compile_dataset(
            dataset,
            &validated,
            self.dialect.as_ref(),
            self.effective_batch_size(),
        )?;

        // The definitions carry their own schemas; they must agree with
        // what the backend actually exposes before anything is submitted
        for (table, schema) in &compiled.base_tables {
            let declared = self.backend.table_schema(table)?;
            if declared != schema {
                return Err(ExtractError::schema_mismatch(table));
            }
        }

        Ok(compiled)
    }

    async fn run(&self, compiled: &CompiledDataset) -> Result<Vec<ResultRow>> {
        log::info!(
            "running {} batch statement(s) against {}",
            compiled.batches.len(),
            self.backend.name()
        );
        // Batches are independent and submitted concurrently; the runner
        // decides whether that means one connection per batch
        let results = try_join_all(
            compiled
                .batches
                .iter()
                .map(|batch| self.runner.run_query(&batch.sql)),
        )
        .await?;
        Ok(combine_batches(
            &compiled.column_names,
            &compiled.batches,
            results,
        ))
    }
}

/// Combine batch results by a full outer join on the patient identifier,
/// re-establishing patient ordering
///
/// A patient missing from one batch gets nulls for that batch's columns;
/// the output is sorted by patient identifier regardless of the order the
/// backend returned rows in.
pub fn combine_batches(
    column_names: &[String],
    batches: &[CompiledBatch],
    results: Vec<Vec<ResultRow>>,
) -> Vec<ResultRow> {
    let column_index: HashMap<&str, usize> = column_names
        .iter()
        .enumerate()
        .map(|(index, name)| (name.as_str(), index))
        .collect();

    let mut merged: BTreeMap<i64, Vec<Value>> = BTreeMap::new();
    for (batch, rows) in batches.iter().zip(results) {
        let slots: Vec<usize> = batch
            .columns
            .iter()
            .map(|name| column_index[name.as_str()])
            .collect();
        for row in rows {
            let cells = merged
                .entry(row.patient_id)
                .or_insert_with(|| vec![Value::Null; column_names.len()]);
            for (slot, cell) in slots.iter().zip(row.cells) {
                cells[*slot] = cell;
            }
        }
    }

    merged
        .into_iter()
        .map(|(patient_id, cells)| ResultRow::new(patient_id, cells))
        .collect()
}
