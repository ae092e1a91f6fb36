//! Frame nodes: logical table projections

use crate::Series;
use cohortsql_types::TableSchema;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// How many rows a frame may yield per patient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameDimension {
    /// At most one row per patient
    Patient,
    /// Zero or more rows per patient
    Event,
}

/// Which end of a sorted event frame a reduction keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickPosition {
    /// First row per patient in sort order
    First,
    /// Last row per patient in sort order
    Last,
}

/// Reference to a backend table, carrying its schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    /// Table name as known to the backend
    pub name: String,
    /// The table's declared schema
    pub schema: TableSchema,
}

/// A logical table projection
///
/// Frames form the spine of the query model: base tables are either
/// patient-level or event-level, filters narrow a frame's row set, and
/// `PickOne` reduces an event frame to patient level by sorting within each
/// patient and keeping one row.
#[derive(Debug)]
pub enum Frame {
    /// Base table with at most one row per patient
    PatientTable(TableRef),
    /// Base table with zero or more rows per patient
    EventTable(TableRef),
    /// Row-set narrowing by a boolean predicate
    Filter(FilterFrame),
    /// Sort an event frame per patient and keep the first or last row
    PickOne(PickOneFrame),
}

/// A frame narrowed by a predicate
#[derive(Debug)]
pub struct FilterFrame {
    /// The frame being filtered
    pub source: Arc<Frame>,
    /// Boolean predicate, rooted in `source`
    pub predicate: Arc<Series>,
}

/// An event frame sorted per patient and reduced to one row
#[derive(Debug)]
pub struct PickOneFrame {
    /// The event frame being reduced
    pub source: Arc<Frame>,
    /// Sort keys, applied in order; each rooted in `source`
    pub sort_by: SmallVec<[Arc<Series>; 2]>,
    /// Which end of the sort order to keep
    pub position: PickPosition,
}

impl Frame {
    /// Create a patient-level base table frame
    pub fn patient_table(name: impl Into<String>, schema: TableSchema) -> Arc<Self> {
        Arc::new(Self::PatientTable(TableRef {
            name: name.into(),
            schema,
        }))
    }

    /// Create an event-level base table frame
    pub fn event_table(name: impl Into<String>, schema: TableSchema) -> Arc<Self> {
        Arc::new(Self::EventTable(TableRef {
            name: name.into(),
            schema,
        }))
    }

    /// Narrow a frame with a boolean predicate
    pub fn filter(source: &Arc<Frame>, predicate: Arc<Series>) -> Arc<Self> {
        Arc::new(Self::Filter(FilterFrame {
            source: Arc::clone(source),
            predicate,
        }))
    }

    /// Sort an event frame and keep the first row per patient
    pub fn pick_first(
        source: &Arc<Frame>,
        sort_by: impl IntoIterator<Item = Arc<Series>>,
    ) -> Arc<Self> {
        Self::pick(source, sort_by, PickPosition::First)
    }

    /// Sort an event frame and keep the last row per patient
    pub fn pick_last(
        source: &Arc<Frame>,
        sort_by: impl IntoIterator<Item = Arc<Series>>,
    ) -> Arc<Self> {
        Self::pick(source, sort_by, PickPosition::Last)
    }

    fn pick(
        source: &Arc<Frame>,
        sort_by: impl IntoIterator<Item = Arc<Series>>,
        position: PickPosition,
    ) -> Arc<Self> {
        Arc::new(Self::PickOne(PickOneFrame {
            source: Arc::clone(source),
            sort_by: sort_by.into_iter().collect(),
            position,
        }))
    }

    /// How many rows this frame yields per patient
    pub fn dimension(&self) -> FrameDimension {
        match self {
            Self::PatientTable(_) | Self::PickOne(_) => FrameDimension::Patient,
            Self::EventTable(_) => FrameDimension::Event,
            Self::Filter(f) => f.source.dimension(),
        }
    }

    /// The schema of the rows this frame yields
    ///
    /// Filtering and reducing never change the column set, so this is
    /// always the schema of the underlying base table.
    pub fn schema(&self) -> &TableSchema {
        match self {
            Self::PatientTable(t) | Self::EventTable(t) => &t.schema,
            Self::Filter(f) => f.source.schema(),
            Self::PickOne(p) => p.source.schema(),
        }
    }

    /// The name of the base table this frame is ultimately drawn from
    pub fn table_name(&self) -> &str {
        match self {
            Self::PatientTable(t) | Self::EventTable(t) => &t.name,
            Self::Filter(f) => f.source.table_name(),
            Self::PickOne(p) => p.source.table_name(),
        }
    }

    /// Select a column from this frame as a series
    pub fn select(self: &Arc<Self>, column: impl Into<String>) -> Arc<Series> {
        Series::column(self, column)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PatientTable(t) | Self::EventTable(t) => write!(f, "{}", t.name),
            Self::Filter(inner) => write!(f, "filter({})", inner.source),
            Self::PickOne(p) => match p.position {
                PickPosition::First => write!(f, "first({})", p.source),
                PickPosition::Last => write!(f, "last({})", p.source),
            },
        }
    }
}
