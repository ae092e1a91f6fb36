//! Statistical disclosure control for measure results
//!
//! Aggregate counts small enough to risk re-identification are suppressed,
//! and everything else is rounded, before measure results leave the
//! pipeline. The threshold and rounding multiple encode an external
//! privacy standard and are deliberately not caller-configurable.
//!
//! The transform is a stateless, lazy, single-pass sequence: each tuple is
//! processed independently, the output is finite iff the input is, and the
//! sequence is not restartable without re-querying the source measures.

use chrono::NaiveDate;
use cohortsql_types::Value;
use serde::{Deserialize, Serialize};

/// Counts at or below this value are suppressed to zero
pub const SUPPRESSION_THRESHOLD: i64 = 7;

/// Surviving counts are rounded to the nearest multiple of this
pub const ROUNDING_MULTIPLE: i64 = 5;

/// One measure result: a (measure, time interval, group) combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureRow {
    /// Measure name
    pub measure: String,
    /// Interval start (inclusive)
    pub interval_start: NaiveDate,
    /// Interval end (inclusive)
    pub interval_end: NaiveDate,
    /// `numerator / denominator`, or `None` when undefined
    pub ratio: Option<f64>,
    /// Numerator count
    pub numerator: i64,
    /// Denominator count
    pub denominator: i64,
    /// Group key values, in group-by order
    pub group: Vec<Value>,
}

/// Suppress-and-round one count
///
/// Counts at or below the suppression threshold become zero; anything
/// larger is rounded to the nearest multiple of five. The half-way
/// behaviour follows the reference banker's rounding, which for integer
/// counts means remainders of one or two round down and three or four
/// round up.
///
/// The count must be non-negative; a negative value indicates an upstream
/// accounting bug and panics rather than being coerced.
pub fn suppress_and_round(count: i64) -> i64 {
    assert!(count >= 0, "count must be non-negative, got {count}");
    if count <= SUPPRESSION_THRESHOLD {
        return 0;
    }
    let remainder = count % ROUNDING_MULTIPLE;
    if remainder <= ROUNDING_MULTIPLE / 2 {
        count - remainder
    } else {
        count - remainder + ROUNDING_MULTIPLE
    }
}

/// Apply disclosure control to a stream of measure results
///
/// Per tuple: the numerator and denominator are suppressed and rounded,
/// the ratio is recomputed from the safe values (`None` when the safe
/// denominator is zero), and every other field passes through unchanged.
pub fn apply_sdc<I>(rows: I) -> impl Iterator<Item = MeasureRow>
where
    I: IntoIterator<Item = MeasureRow>,
{
    rows.into_iter().map(|row| {
        let numerator = suppress_and_round(row.numerator);
        let denominator = suppress_and_round(row.denominator);
        let ratio = if denominator > 0 {
            Some(numerator as f64 / denominator as f64)
        } else {
            None
        };
        MeasureRow {
            numerator,
            denominator,
            ratio,
            ..row
        }
    })
}
