//! Core data types for the overshoot scheduler.

use pyo3::prelude::*;

/// A preemptible task: it must run for `duration` units and should finish
/// by `deadline`.
#[pyclass]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Task {
    /// 1-based position in insertion order.
    #[pyo3(get)]
    pub id: usize,
    #[pyo3(get)]
    pub deadline: i64,
    #[pyo3(get)]
    pub duration: i64,
}

impl Task {
    pub fn new(id: usize, deadline: i64, duration: i64) -> Self {
        Self {
            id,
            deadline,
            duration,
        }
    }
}

#[pymethods]
impl Task {
    #[new]
    fn py_new(id: usize, deadline: i64, duration: i64) -> Self {
        Self::new(id, deadline, duration)
    }

    fn __repr__(&self) -> String {
        format!(
            "Task(id={}, deadline={}, duration={})",
            self.id, self.deadline, self.duration
        )
    }
}

/// One task's slot in an earliest-deadline-first schedule.
#[pyclass]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledTask {
    #[pyo3(get)]
    pub task_id: usize,
    #[pyo3(get)]
    pub start: i64,
    #[pyo3(get)]
    pub end: i64,
}

#[pymethods]
impl ScheduledTask {
    fn __repr__(&self) -> String {
        format!(
            "ScheduledTask(task_id={}, start={}, end={})",
            self.task_id, self.start, self.end
        )
    }
}

/// Result of the reference scheduler.
#[pyclass]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OracleResult {
    /// Worst `end - deadline` over the schedule, clamped to 0.
    #[pyo3(get)]
    pub max_overshoot: i64,
    #[pyo3(get)]
    pub schedule: Vec<ScheduledTask>,
}

#[pymethods]
impl OracleResult {
    fn __repr__(&self) -> String {
        format!(
            "OracleResult(max_overshoot={}, scheduled_tasks={})",
            self.max_overshoot,
            self.schedule.len()
        )
    }
}
