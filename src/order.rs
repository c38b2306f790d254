//! Ordering rules for the active list.
//!
//! Positions are plain integers; lower sorts first. New and reactivated
//! tasks go above the current minimum so nothing else has to be renumbered.

use crate::models::{Direction, Task};
use std::cmp::Reverse;

/// Position for a task inserted at the top of the list.
///
/// `min_position` is the minimum over all tasks, or `None` for an empty
/// store. Returns `None` when `min - 1` would overflow; callers reindex and
/// try again.
pub fn top_position(min_position: Option<i64>) -> Option<i64> {
    match min_position {
        Some(min) => min.checked_sub(1),
        None => Some(0),
    }
}

/// Split tasks into (active, completed) display groups.
///
/// Active tasks ascend by position, completed tasks descend by completion
/// time. Both sorts are stable, so ties keep the store's iteration order.
pub fn split_for_display(tasks: Vec<Task>) -> (Vec<Task>, Vec<Task>) {
    let (mut active, mut completed): (Vec<Task>, Vec<Task>) =
        tasks.into_iter().partition(Task::is_active);

    active.sort_by_key(|t| t.position);
    completed.sort_by_key(|t| Reverse(t.completed_at));

    (active, completed)
}

/// Find the neighbor a task swaps with when moved one step.
///
/// `active` must already be in display order. Returns `None` if the task is
/// not in the list (completed or unknown) or already at that edge.
pub fn neighbor<'a>(active: &'a [Task], id: i64, direction: Direction) -> Option<&'a Task> {
    let index = active.iter().position(|t| t.id == id)?;
    match direction {
        Direction::Up => index.checked_sub(1).and_then(|i| active.get(i)),
        Direction::Down => active.get(index + 1),
    }
}

/// Positions for an explicit order: each id gets its index in the sequence.
///
/// Duplicate ids resolve to their last index, which keeps repeated
/// application idempotent.
pub fn sequence_positions(order: &[i64]) -> Vec<(i64, i64)> {
    order
        .iter()
        .enumerate()
        .map(|(index, &id)| (id, index as i64))
        .collect()
}
