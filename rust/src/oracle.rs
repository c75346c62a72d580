//! Reference earliest-deadline-first scheduler.
//!
//! Running tasks in deadline order minimizes the worst overshoot, so a full
//! simulation per prefix gives the answer the incremental scheduler must
//! reproduce. Each call is O(n log n); [`prefix_overshoots`] is therefore
//! quadratic and only meant for validation.

use crate::models::{OracleResult, ScheduledTask, Task};

/// Schedule `tasks` back to back in deadline order (stable on ties).
pub fn schedule(tasks: &[Task]) -> OracleResult {
    let mut ordered = tasks.to_vec();
    ordered.sort_by_key(|t| t.deadline);

    let mut schedule = Vec::with_capacity(ordered.len());
    let mut now = 0i64;
    let mut max_overshoot = 0i64;
    for task in &ordered {
        let start = now;
        now += task.duration;
        schedule.push(ScheduledTask {
            task_id: task.id,
            start,
            end: now,
        });
        max_overshoot = max_overshoot.max(now - task.deadline);
    }

    OracleResult {
        max_overshoot,
        schedule,
    }
}

/// Worst overshoot after each prefix of `tasks`.
pub fn prefix_overshoots(tasks: &[Task]) -> Vec<i64> {
    (1..=tasks.len())
        .map(|len| schedule(&tasks[..len]).max_overshoot)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Task> {
        vec![
            Task::new(1, 2, 2),
            Task::new(2, 1, 1),
            Task::new(3, 4, 3),
            Task::new(4, 10, 1),
            Task::new(5, 2, 1),
        ]
    }

    #[test]
    fn test_sample_prefixes() {
        assert_eq!(prefix_overshoots(&sample()), vec![0, 1, 2, 2, 3]);
    }

    #[test]
    fn test_schedule_layout() {
        let result = schedule(&sample());
        let order: Vec<usize> = result.schedule.iter().map(|s| s.task_id).collect();
        // Task 1 and 5 share deadline 2; insertion order is kept.
        assert_eq!(order, vec![2, 1, 5, 3, 4]);
        assert_eq!(
            result.schedule[3],
            ScheduledTask {
                task_id: 3,
                start: 4,
                end: 7
            }
        );
        assert_eq!(result.max_overshoot, 3);
    }

    #[test]
    fn test_empty() {
        let result = schedule(&[]);
        assert_eq!(result.max_overshoot, 0);
        assert!(result.schedule.is_empty());
        assert!(prefix_overshoots(&[]).is_empty());
    }

    #[test]
    fn test_never_negative() {
        let result = schedule(&[Task::new(1, 100, 3)]);
        assert_eq!(result.max_overshoot, 0);
    }
}
