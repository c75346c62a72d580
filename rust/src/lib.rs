//! Incremental scheduling of preemptible tasks against deadlines.
//!
//! After each task is added, reports the smallest achievable maximum amount
//! by which any task finishes past its deadline, in O(log n) per task.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

mod config;
pub mod logging;
mod models;
pub mod oracle;
pub mod prefix_sum;
pub mod scheduler;
pub mod segment_tree;

pub use config::SchedulerConfig;
pub use models::{OracleResult, ScheduledTask, Task};
pub use prefix_sum::{PrefixSumError, PrefixSumTree};
pub use scheduler::{min_max_overshoots, IncrementalScheduler, SchedulerError};
pub use segment_tree::{DynamicSegmentTree, SegmentTreeError, ValueSource};

fn value_error(err: SchedulerError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Incremental scheduler (PyO3 wrapper).
#[pyclass(name = "IncrementalScheduler")]
pub struct PyIncrementalScheduler {
    inner: IncrementalScheduler,
}

#[pymethods]
impl PyIncrementalScheduler {
    #[new]
    #[pyo3(signature = (config=None))]
    fn new(config: Option<SchedulerConfig>) -> Self {
        Self {
            inner: IncrementalScheduler::new(config.unwrap_or_default()),
        }
    }

    /// Add a task; `task_id` must be the number of tasks so far plus one.
    fn add(&mut self, task_id: usize, deadline: i64, duration: i64) -> PyResult<()> {
        self.inner
            .add(task_id, deadline, duration)
            .map_err(value_error)
    }

    /// Add a task under the next id and return it.
    fn add_task(&mut self, deadline: i64, duration: i64) -> PyResult<usize> {
        self.inner.add_task(deadline, duration).map_err(value_error)
    }

    fn prep(&mut self) -> PyResult<()> {
        self.inner.prep().map_err(value_error)
    }

    /// Insert task `task_id` (ids in order 1, 2, ...) and return the worst overshoot.
    fn insert_and_query(&mut self, task_id: usize) -> PyResult<i64> {
        self.inner.insert_and_query(task_id).map_err(value_error)
    }

    /// Insert all remaining tasks and return the overshoot after each.
    fn run(&mut self) -> PyResult<Vec<i64>> {
        self.inner.run().map_err(value_error)
    }

    #[getter]
    fn inserted(&self) -> usize {
        self.inner.inserted()
    }

    #[getter]
    fn prepared(&self) -> bool {
        self.inner.is_prepared()
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "IncrementalScheduler(tasks={}, prepared={}, inserted={})",
            self.inner.len(),
            self.inner.is_prepared(),
            self.inner.inserted()
        )
    }
}

/// Worst overshoot after each prefix of `(deadline, duration)` pairs.
///
/// # Raises
/// * ValueError if a deadline or duration is below 1 (when validation is on)
#[pyfunction]
#[pyo3(name = "min_max_overshoots", signature = (pairs, config=None))]
fn py_min_max_overshoots(
    pairs: Vec<(i64, i64)>,
    config: Option<SchedulerConfig>,
) -> PyResult<Vec<i64>> {
    min_max_overshoots(pairs, config.unwrap_or_default()).map_err(value_error)
}

/// Earliest-deadline-first schedule of `tasks` with its worst overshoot.
#[pyfunction]
fn schedule_edf(tasks: Vec<Task>) -> OracleResult {
    oracle::schedule(&tasks)
}

/// The tasksched_rust Python module.
#[pymodule]
fn tasksched_rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Core data types
    m.add_class::<Task>()?;
    m.add_class::<ScheduledTask>()?;
    m.add_class::<OracleResult>()?;

    // Config types
    m.add_class::<SchedulerConfig>()?;

    // Scheduler
    m.add_class::<PyIncrementalScheduler>()?;
    m.add_function(wrap_pyfunction!(py_min_max_overshoots, m)?)?;
    m.add_function(wrap_pyfunction!(schedule_edf, m)?)?;

    Ok(())
}
