//! Serving-phase state, created once by `prep`.

use crate::models::Task;
use crate::prefix_sum::PrefixSumTree;
use crate::segment_tree::DynamicSegmentTree;

use super::core::SchedulerError;
use super::values::NothingInserted;

/// Trees and rank tables sized to the final task count.
///
/// Neither tree is resized after construction; only prefix-sum cells and
/// segment-tree argmax links change as tasks are inserted.
#[derive(Clone, Debug)]
pub(crate) struct ServingState {
    /// Tasks in deadline order (stable on ties); index `rank - 1`.
    pub(crate) tasks_by_rank: Vec<Task>,
    /// Rank of each task; index `id - 1`.
    pub(crate) id_to_rank: Vec<usize>,
    /// Inserted durations by rank.
    pub(crate) prefix: PrefixSumTree,
    pub(crate) segtree: DynamicSegmentTree,
    /// Next task id `insert_and_query` accepts.
    pub(crate) next_id: usize,
    /// Overshoot reported by the latest insertion.
    pub(crate) last_overshoot: i64,
}

impl ServingState {
    /// Rank `tasks` (given in id order) by deadline and allocate both trees.
    ///
    /// Fails with `ValueOverflow` if some subset of the durations, less
    /// some deadline, would not fit in an `i64`.
    pub(crate) fn new(tasks: &[Task]) -> Result<Self, SchedulerError> {
        if tasks.is_empty() {
            return Err(SchedulerError::NoTasks);
        }
        check_value_bounds(tasks)?;
        let ntasks = tasks.len();

        let mut tasks_by_rank = tasks.to_vec();
        tasks_by_rank.sort_by_key(|t| t.deadline);

        let mut id_to_rank = vec![0; ntasks];
        for (i, task) in tasks_by_rank.iter().enumerate() {
            id_to_rank[task.id - 1] = i + 1;
        }

        let segtree = DynamicSegmentTree::build(1, ntasks, &mut NothingInserted)?;

        Ok(Self {
            tasks_by_rank,
            id_to_rank,
            prefix: PrefixSumTree::new(ntasks),
            segtree,
            next_id: 1,
            last_overshoot: 0,
        })
    }

    pub(crate) fn ntasks(&self) -> usize {
        self.tasks_by_rank.len()
    }

    /// Whether every task has been inserted.
    pub(crate) fn is_exhausted(&self) -> bool {
        self.next_id > self.ntasks()
    }
}

/// Every prefix sum (and every Fenwick cell) is a sum over a subset of the
/// durations, so it lies between the sum of the negative durations and the
/// sum of the positive ones. Checking the extreme deadlines against those
/// two bounds rules out overflow for every later insertion.
fn check_value_bounds(tasks: &[Task]) -> Result<(), SchedulerError> {
    let mut lowest: i64 = 0;
    let mut highest: i64 = 0;
    for task in tasks {
        let bound = if task.duration < 0 {
            &mut lowest
        } else {
            &mut highest
        };
        *bound = bound
            .checked_add(task.duration)
            .ok_or(SchedulerError::ValueOverflow)?;
    }

    let earliest = tasks.iter().map(|t| t.deadline).min().unwrap_or(0);
    let latest = tasks.iter().map(|t| t.deadline).max().unwrap_or(0);
    highest
        .checked_sub(earliest)
        .and(lowest.checked_sub(latest))
        .map(|_| ())
        .ok_or(SchedulerError::ValueOverflow)
}
