//! Configuration for the incremental scheduler.

use pyo3::prelude::*;

/// Knobs for [`crate::IncrementalScheduler`].
#[pyclass]
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    #[pyo3(get, set)]
    pub verbosity: u8,
    /// Reject tasks whose deadline or duration is below 1.
    #[pyo3(get, set)]
    pub validate_tasks: bool,
    /// Expected number of tasks, used to pre-size the task table.
    #[pyo3(get, set)]
    pub expected_tasks: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            validate_tasks: true,
            expected_tasks: None,
        }
    }
}

#[pymethods]
impl SchedulerConfig {
    #[new]
    #[pyo3(signature = (verbosity=0, validate_tasks=true, expected_tasks=None))]
    fn new(verbosity: u8, validate_tasks: bool, expected_tasks: Option<usize>) -> Self {
        Self {
            verbosity,
            validate_tasks,
            expected_tasks,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "SchedulerConfig(verbosity={}, validate_tasks={}, expected_tasks={:?})",
            self.verbosity, self.validate_tasks, self.expected_tasks
        )
    }
}
