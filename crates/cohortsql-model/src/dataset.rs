//! Dataset definitions: the `column_definitions` mapping handed to the engine

use crate::Series;
use cohortsql_diagnostics::{ExtractError, Result};
use indexmap::IndexMap;
use std::sync::Arc;

/// An ordered mapping of output column name to series
///
/// Column order defines output column order. Names are unique; inserting a
/// duplicate is an error rather than a silent replacement. An optional
/// boolean patient-level `population` predicate narrows which patients
/// appear in the output; without one, every patient present in any
/// referenced table is included.
///
/// Datasets are values, not entries in a process-wide registry: each one is
/// built by the caller and threaded explicitly through the pipeline, so
/// multiple definitions can be compiled concurrently without cross-talk.
#[derive(Debug, Default)]
pub struct Dataset {
    columns: IndexMap<String, Arc<Series>>,
    population: Option<Arc<Series>>,
}

impl Dataset {
    /// Create an empty dataset definition
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an output column
    ///
    /// Fails with a query-model error if the name is already taken.
    pub fn add_column(&mut self, name: impl Into<String>, series: Arc<Series>) -> Result<()> {
        let name = name.into();
        if self.columns.contains_key(&name) {
            return Err(ExtractError::duplicate_column(name));
        }
        self.columns.insert(name, series);
        Ok(())
    }

    /// Set the population predicate
    pub fn set_population(&mut self, predicate: Arc<Series>) {
        self.population = Some(predicate);
    }

    /// Output columns in declaration order
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Arc<Series>)> {
        self.columns.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// Output column names in declaration order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// The population predicate, if one was set
    pub fn population(&self) -> Option<&Arc<Series>> {
        self.population.as_ref()
    }

    /// Number of output columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when no output columns are defined
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
