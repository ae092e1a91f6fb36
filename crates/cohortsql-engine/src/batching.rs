//! Splitting wide join fan-outs into backend-safe chunks
//!
//! When a dataset needs more patient-level table expressions than the
//! backend safely joins in one statement, the join groups are split into
//! fixed-size batches, each compiled and executed independently, and the
//! batch results are combined by an outer join on the patient identifier.

use cohortsql_diagnostics::{ExtractError, Result};

/// Split a sequence into ordered chunks of at most `batch_size` items
///
/// The concatenation of the yielded batches equals the input; every batch
/// except possibly the last has exactly `batch_size` items. `None` returns
/// the whole input as one batch. Empty input yields zero batches in either
/// mode. A zero batch size is a caller-configuration bug and fails with a
/// batch-config error.
///
/// The partition is a pure function of the input and the size; nothing is
/// reordered or rebalanced.
pub fn split_into_batches<I>(items: I, batch_size: Option<usize>) -> Result<Batches<I::IntoIter>>
where
    I: IntoIterator,
{
    if batch_size == Some(0) {
        return Err(ExtractError::invalid_batch_size(0));
    }
    Ok(Batches {
        inner: items.into_iter(),
        batch_size,
    })
}

/// Lazy iterator of batches produced by [`split_into_batches`]
#[derive(Debug)]
pub struct Batches<I: Iterator> {
    inner: I,
    batch_size: Option<usize>,
}

impl<I: Iterator> Iterator for Batches<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.inner.next()?;
        let mut batch = vec![first];
        match self.batch_size {
            None => batch.extend(self.inner.by_ref()),
            Some(size) => {
                while batch.len() < size {
                    match self.inner.next() {
                        Some(item) => batch.push(item),
                        None => break,
                    }
                }
            }
        }
        Some(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(items: Vec<i32>, batch_size: Option<usize>) -> Vec<Vec<i32>> {
        split_into_batches(items, batch_size).unwrap().collect()
    }

    #[test]
    fn test_empty_input_yields_no_batches() {
        assert_eq!(collect(vec![], Some(10)), Vec::<Vec<i32>>::new());
        assert_eq!(collect(vec![], None), Vec::<Vec<i32>>::new());
    }

    #[test]
    fn test_exact_and_ragged_splits() {
        assert_eq!(
            collect(vec![0, 1, 2, 3, 4, 5, 6], Some(3)),
            vec![vec![0, 1, 2], vec![3, 4, 5], vec![6]]
        );
        assert_eq!(collect(vec![0, 1, 2, 3], Some(6)), vec![vec![0, 1, 2, 3]]);
        assert_eq!(
            collect(vec![0, 1, 2, 3], Some(2)),
            vec![vec![0, 1], vec![2, 3]]
        );
    }

    #[test]
    fn test_none_returns_single_batch() {
        assert_eq!(collect(vec![0, 1, 2], None), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_zero_batch_size_is_config_error() {
        let err = split_into_batches(vec![1, 2, 3], Some(0)).unwrap_err();
        assert!(matches!(err, ExtractError::BatchConfig { .. }));
    }

    #[test]
    fn test_lazy_consumption() {
        // Pulling one batch must not exhaust the underlying iterator
        let pulled = std::cell::Cell::new(0);
        let counted = (0..100).inspect(|_| pulled.set(pulled.get() + 1));
        let mut batches = split_into_batches(counted, Some(10)).unwrap();
        let first = batches.next().unwrap();
        assert_eq!(first.len(), 10);
        assert!(pulled.get() <= 10);
    }
}
