//! Value functions fed to the segment tree during scheduling.

use rustc_hash::FxHashMap;

use crate::log_debug;
use crate::models::Task;
use crate::prefix_sum::PrefixSumTree;
use crate::segment_tree::ValueSource;

use super::core::SchedulerError;

/// Memoized values for a single update pass, keyed by rank.
///
/// A prefix sum costs O(log n) and the tree asks for the same rank on
/// several levels of one path, so each rank is computed at most once.
#[derive(Debug, Default)]
pub struct ValueCache {
    values: FxHashMap<usize, Option<i64>>,
    hits: usize,
}

impl ValueCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            hits: 0,
        }
    }

    /// Return the cached value for `rank`, computing it on first use.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        rank: usize,
        compute: impl FnOnce() -> Result<Option<i64>, E>,
    ) -> Result<Option<i64>, E> {
        if let Some(&value) = self.values.get(&rank) {
            self.hits += 1;
            return Ok(value);
        }
        let value = compute()?;
        self.values.insert(rank, value);
        Ok(value)
    }

    /// Distinct ranks computed so far.
    pub fn evaluations(&self) -> usize {
        self.values.len()
    }

    /// Lookups answered from the cache.
    pub fn hits(&self) -> usize {
        self.hits
    }
}

/// Overshoot of the task at each rank if every inserted task ran in
/// deadline order: `prefix_sum(rank) - deadline(rank)`, or `None` (negative
/// infinity) for ranks whose task has not been inserted yet.
pub struct OvershootValues<'a> {
    prefix: &'a PrefixSumTree,
    tasks_by_rank: &'a [Task],
    /// Highest task id inserted so far.
    inserted: usize,
    cache: ValueCache,
    verbosity: u8,
}

impl<'a> OvershootValues<'a> {
    pub fn new(
        prefix: &'a PrefixSumTree,
        tasks_by_rank: &'a [Task],
        inserted: usize,
        verbosity: u8,
    ) -> Self {
        let depth = (usize::BITS - tasks_by_rank.len().leading_zeros()) as usize;
        Self {
            prefix,
            tasks_by_rank,
            inserted,
            cache: ValueCache::with_capacity(2 * depth + 1),
            verbosity,
        }
    }

    pub fn cache(&self) -> &ValueCache {
        &self.cache
    }
}

impl ValueSource for OvershootValues<'_> {
    type Value = Option<i64>;
    type Error = SchedulerError;

    fn value_at(&mut self, rank: usize) -> Result<Option<i64>, SchedulerError> {
        let task = rank
            .checked_sub(1)
            .and_then(|i| self.tasks_by_rank.get(i))
            .copied()
            .ok_or(SchedulerError::UnknownRank {
                rank,
                ntasks: self.tasks_by_rank.len(),
            })?;
        let (prefix, inserted, verbosity) = (self.prefix, self.inserted, self.verbosity);

        self.cache.get_or_try_insert_with(rank, || {
            if task.id > inserted {
                return Ok(None);
            }
            // In range: `ServingState::new` bounds every subset sum.
            let value = prefix.sum(rank)? - task.deadline;
            log_debug!(
                verbosity,
                "    value(rank={}) = {} (task {})",
                rank,
                value,
                task.id
            );
            Ok(Some(value))
        })
    }
}

/// Value source that reports every rank as not yet inserted.
pub struct NothingInserted;

impl ValueSource for NothingInserted {
    type Value = Option<i64>;
    type Error = SchedulerError;

    fn value_at(&mut self, _rank: usize) -> Result<Option<i64>, SchedulerError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks_by_rank() -> Vec<Task> {
        // Deadline order of (1,2,2), (2,1,1), (3,4,3).
        vec![Task::new(2, 1, 1), Task::new(1, 2, 2), Task::new(3, 4, 3)]
    }

    #[test]
    fn test_cache_computes_once() {
        let mut cache = ValueCache::default();
        let mut calls = 0;
        for _ in 0..3 {
            let value: Result<_, ()> = cache.get_or_try_insert_with(4, || {
                calls += 1;
                Ok(Some(7))
            });
            assert_eq!(value, Ok(Some(7)));
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.evaluations(), 1);
        assert_eq!(cache.hits(), 2);
    }

    #[test]
    fn test_cache_does_not_store_errors() {
        let mut cache = ValueCache::default();
        let first: Result<Option<i64>, &str> = cache.get_or_try_insert_with(1, || Err("boom"));
        assert!(first.is_err());
        let second: Result<Option<i64>, &str> = cache.get_or_try_insert_with(1, || Ok(None));
        assert_eq!(second, Ok(None));
        assert_eq!(cache.evaluations(), 1);
    }

    #[test]
    fn test_uninserted_ranks_are_negative_infinity() {
        let tasks = tasks_by_rank();
        let mut prefix = PrefixSumTree::new(3);
        // Only task 1 (rank 2) inserted.
        prefix.update(2, 2).unwrap();
        let mut values = OvershootValues::new(&prefix, &tasks, 1, 0);

        assert_eq!(values.value_at(1).unwrap(), None);
        assert_eq!(values.value_at(2).unwrap(), Some(0));
        assert_eq!(values.value_at(3).unwrap(), None);
    }

    #[test]
    fn test_values_after_two_insertions() {
        let tasks = tasks_by_rank();
        let mut prefix = PrefixSumTree::new(3);
        prefix.update(2, 2).unwrap();
        prefix.update(1, 1).unwrap();
        let mut values = OvershootValues::new(&prefix, &tasks, 2, 0);

        assert_eq!(values.value_at(1).unwrap(), Some(0));
        assert_eq!(values.value_at(2).unwrap(), Some(1));
        assert_eq!(values.value_at(2).unwrap(), Some(1));
        assert_eq!(values.cache().evaluations(), 2);
        assert_eq!(values.cache().hits(), 1);
    }

    #[test]
    fn test_unknown_rank() {
        let tasks = tasks_by_rank();
        let prefix = PrefixSumTree::new(3);
        let mut values = OvershootValues::new(&prefix, &tasks, 3, 0);
        assert!(matches!(
            values.value_at(0),
            Err(SchedulerError::UnknownRank { rank: 0, ntasks: 3 })
        ));
        assert!(values.value_at(4).is_err());
    }

    #[test]
    fn test_nothing_inserted() {
        assert_eq!(NothingInserted.value_at(42).unwrap(), None);
    }
}
