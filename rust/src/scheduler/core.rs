//! Incremental minimum-max-overshoot scheduler.
//!
//! Running tasks in deadline order is optimal, and under that order the
//! task at rank `r` finishes at `prefix_sum(r)`. Inserting a task at rank
//! `r` shifts every later rank's finish time by the same amount, so only
//! the segment-tree path through `r` needs re-ranking: O(log n) value
//! lookups per insertion, each memoized for the pass.

use thiserror::Error;

use crate::config::SchedulerConfig;
use crate::models::Task;
use crate::prefix_sum::PrefixSumError;
use crate::segment_tree::{SegmentTreeError, ValueSource};
use crate::{log_changes, log_checks, log_debug};

use super::state::ServingState;
use super::values::OvershootValues;

/// Errors that can occur while collecting or scheduling tasks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Task {got} is out of sequence, expected task {expected}")]
    OutOfSequence { expected: usize, got: usize },
    #[error("Task {id} does not exist ({ntasks} tasks known)")]
    UnknownTask { id: usize, ntasks: usize },
    #[error("Rank {rank} does not exist ({ntasks} tasks ranked)")]
    UnknownRank { rank: usize, ntasks: usize },
    #[error("Invalid task {id}: {reason}")]
    InvalidTask { id: usize, reason: String },
    #[error("Scheduler is already prepared; no more tasks can be added")]
    AlreadyPrepared,
    #[error("Scheduler must be prepared before inserting tasks")]
    NotPrepared,
    #[error("Cannot prepare a scheduler with no tasks")]
    NoTasks,
    #[error("Task durations and deadlines are too large for i64 overshoot arithmetic")]
    ValueOverflow,
    #[error(transparent)]
    PrefixSum(#[from] PrefixSumError),
    #[error(transparent)]
    SegmentTree(#[from] SegmentTreeError),
}

#[derive(Clone, Debug)]
enum Phase {
    Collecting,
    Serving(ServingState),
}

/// Reports the minimum achievable worst overshoot after each task insertion.
///
/// Tasks are first collected with [`add`](Self::add), then [`prep`](Self::prep)
/// fixes the rank universe, then [`insert_and_query`](Self::insert_and_query)
/// feeds them back in id order.
#[derive(Clone, Debug)]
pub struct IncrementalScheduler {
    config: SchedulerConfig,
    /// Tasks in id order; index `id - 1`.
    tasks: Vec<Task>,
    phase: Phase,
}

impl Default for IncrementalScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl IncrementalScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let tasks = Vec::with_capacity(config.expected_tasks.unwrap_or(0));
        Self {
            config,
            tasks,
            phase: Phase::Collecting,
        }
    }

    /// Replace the configuration, reserving room for `expected_tasks`.
    ///
    /// Validation applies only to tasks added afterwards.
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        if let Some(expected) = config.expected_tasks {
            self.tasks.reserve(expected.saturating_sub(self.tasks.len()));
        }
        self.config = config;
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Record a task. `id` must be the number of tasks added so far plus one.
    pub fn add(&mut self, id: usize, deadline: i64, duration: i64) -> Result<(), SchedulerError> {
        if self.is_prepared() {
            return Err(SchedulerError::AlreadyPrepared);
        }
        let expected = self.tasks.len() + 1;
        if id != expected {
            return Err(SchedulerError::OutOfSequence { expected, got: id });
        }
        if self.config.validate_tasks {
            if deadline < 1 {
                return Err(SchedulerError::InvalidTask {
                    id,
                    reason: format!("deadline {} is below 1", deadline),
                });
            }
            if duration < 1 {
                return Err(SchedulerError::InvalidTask {
                    id,
                    reason: format!("duration {} is below 1", duration),
                });
            }
        }

        self.tasks.push(Task::new(id, deadline, duration));
        Ok(())
    }

    /// Record a task under the next free id and return that id.
    pub fn add_task(&mut self, deadline: i64, duration: i64) -> Result<usize, SchedulerError> {
        let id = self.tasks.len() + 1;
        self.add(id, deadline, duration)?;
        Ok(id)
    }

    /// Rank the collected tasks by deadline and build both trees.
    ///
    /// One-way: afterwards no more tasks can be added.
    pub fn prep(&mut self) -> Result<(), SchedulerError> {
        if self.is_prepared() {
            return Err(SchedulerError::AlreadyPrepared);
        }
        let state = ServingState::new(&self.tasks)?;
        log_changes!(
            self.config.verbosity,
            "Prepared {} tasks ({} segment tree nodes)",
            state.ntasks(),
            state.segtree.node_count()
        );
        self.phase = Phase::Serving(state);
        Ok(())
    }

    /// Insert task `id` and return the worst overshoot of an optimal
    /// schedule over tasks `1..=id`.
    ///
    /// Ids must arrive as 1, 2, 3, ...; a repeated or skipped id fails.
    pub fn insert_and_query(&mut self, id: usize) -> Result<i64, SchedulerError> {
        let verbosity = self.config.verbosity;
        let Phase::Serving(state) = &mut self.phase else {
            return Err(SchedulerError::NotPrepared);
        };

        let ntasks = state.ntasks();
        if id == 0 || id > ntasks {
            return Err(SchedulerError::UnknownTask { id, ntasks });
        }
        if id != state.next_id {
            return Err(SchedulerError::OutOfSequence {
                expected: state.next_id,
                got: id,
            });
        }

        let rank = state.id_to_rank[id - 1];
        let task = state.tasks_by_rank[rank - 1];
        log_checks!(
            verbosity,
            "Insert task {} (rank {}, deadline {}, duration {})",
            id,
            rank,
            task.deadline,
            task.duration
        );

        state.prefix.update(rank, task.duration)?;

        let mut values = OvershootValues::new(&state.prefix, &state.tasks_by_rank, id, verbosity);
        state.segtree.update(rank, &mut values)?;

        let worst = state.segtree.argmax();
        let overshoot = values.value_at(worst)?.map_or(0, |v| v.max(0));
        log_debug!(
            verbosity,
            "  Pass evaluated {} ranks ({} cache hits)",
            values.cache().evaluations(),
            values.cache().hits()
        );
        log_checks!(verbosity, "  Worst rank {} -> overshoot {}", worst, overshoot);
        if overshoot != state.last_overshoot {
            log_changes!(
                verbosity,
                "Overshoot {} -> {} after task {}",
                state.last_overshoot,
                overshoot,
                id
            );
        }

        state.next_id += 1;
        state.last_overshoot = overshoot;
        Ok(overshoot)
    }

    /// Insert the next unseen task. Returns `None` once every task is in.
    pub fn insert_next(&mut self) -> Result<Option<i64>, SchedulerError> {
        let next = match &self.phase {
            Phase::Collecting => return Err(SchedulerError::NotPrepared),
            Phase::Serving(state) if state.is_exhausted() => return Ok(None),
            Phase::Serving(state) => state.next_id,
        };
        self.insert_and_query(next).map(Some)
    }

    /// Insert every remaining task, returning the overshoot after each.
    pub fn run(&mut self) -> Result<Vec<i64>, SchedulerError> {
        let mut overshoots = Vec::with_capacity(self.len().saturating_sub(self.inserted()));
        while let Some(overshoot) = self.insert_next()? {
            overshoots.push(overshoot);
        }
        Ok(overshoots)
    }

    /// Number of tasks added.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn is_prepared(&self) -> bool {
        matches!(self.phase, Phase::Serving(_))
    }

    /// Number of tasks inserted since `prep`.
    pub fn inserted(&self) -> usize {
        match &self.phase {
            Phase::Collecting => 0,
            Phase::Serving(state) => state.next_id - 1,
        }
    }

    pub fn task(&self, id: usize) -> Option<&Task> {
        id.checked_sub(1).and_then(|i| self.tasks.get(i))
    }

    /// Deadline rank of task `id`, once prepared.
    pub fn rank_of(&self, id: usize) -> Option<usize> {
        match &self.phase {
            Phase::Collecting => None,
            Phase::Serving(state) => id
                .checked_sub(1)
                .and_then(|i| state.id_to_rank.get(i))
                .copied(),
        }
    }

    /// Overshoot reported by the latest insertion (0 before any).
    pub fn current_overshoot(&self) -> i64 {
        match &self.phase {
            Phase::Collecting => 0,
            Phase::Serving(state) => state.last_overshoot,
        }
    }

    /// Rank currently reported as worst, once at least one task is inserted.
    pub fn worst_rank(&self) -> Option<usize> {
        match &self.phase {
            Phase::Serving(state) if state.next_id > 1 => Some(state.segtree.argmax()),
            _ => None,
        }
    }
}

/// Worst overshoot after each prefix of `(deadline, duration)` pairs.
///
/// An empty input yields an empty result.
pub fn min_max_overshoots(
    pairs: impl IntoIterator<Item = (i64, i64)>,
    config: SchedulerConfig,
) -> Result<Vec<i64>, SchedulerError> {
    let mut scheduler = IncrementalScheduler::new(config);
    for (deadline, duration) in pairs {
        scheduler.add_task(deadline, duration)?;
    }
    if scheduler.is_empty() {
        return Ok(Vec::new());
    }
    scheduler.prep()?;
    scheduler.run()
}
