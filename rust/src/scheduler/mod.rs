//! Incremental scheduler reporting the minimum worst overshoot per insertion.
//!
//! Composes a prefix-sum tree (finish time of each deadline rank) with a
//! dynamic segment tree (which rank currently overshoots the most).
//!
//! The serving state behind [`IncrementalScheduler`] stays internal to the
//! crate, so its rank tables and trees can't be edited from outside:
//!
//! ```compile_fail
//! use tasksched_rust::scheduler::ServingState;
//! ```

mod core;
mod state;
mod values;

pub use self::core::{min_max_overshoots, IncrementalScheduler, SchedulerError};
pub use values::{NothingInserted, OvershootValues, ValueCache};
