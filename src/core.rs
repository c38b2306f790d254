use crate::db::Database;
use crate::dependency::{normalize_label, normalize_text, parse_requirement};
use crate::error::{Result, TaskError};
use crate::models::{Color, Direction, NewTask, Task, TaskEdit, TaskListing};
use crate::order;
use chrono::Utc;
use std::collections::HashMap;
use std::path::Path;

/// Core business logic: ordering, lifecycle and dependency consistency.
///
/// Every public operation runs as one store transaction, so a failure
/// leaves the previous state untouched.
pub struct TaskList {
    db: Database,
}

impl TaskList {
    /// Open (and migrate) the store at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = Database::open(path)?;
        Ok(TaskList { db })
    }

    // ==================== Queries ====================

    /// Get a task by ID
    pub fn get_task(&self, id: i64) -> Result<Task> {
        self.db.get_task(id)?.ok_or(TaskError::TaskNotFound(id))
    }

    /// Tasks split for display, optionally restricted to one label.
    ///
    /// Labels and the status map always cover the whole store.
    pub fn list_tasks(&self, label_filter: Option<&str>) -> Result<TaskListing> {
        self.db.atomically(|db| {
            let all = db.get_all_tasks()?;
            let status_map: HashMap<i64, bool> =
                all.iter().map(|t| (t.id, t.is_completed())).collect();

            let tasks = match label_filter.filter(|l| !l.is_empty()) {
                Some(label) => db.get_tasks_with_label(label)?,
                None => all,
            };
            let (active, completed) = order::split_for_display(tasks);

            Ok(TaskListing {
                active,
                completed,
                labels: db.distinct_labels()?,
                status_map,
            })
        })
    }

    // ==================== Task Operations ====================

    /// Create a task at the top of the list.
    ///
    /// Returns `None` (and stores nothing) when the content is blank.
    pub fn create_task(&self, new: &NewTask) -> Result<Option<Task>> {
        if new.content.trim().is_empty() {
            return Ok(None);
        }

        let color = Color::parse_or_default(new.color.as_deref());
        let label = normalize_label(new.label.as_deref());
        let due_date = normalize_text(new.due_date.as_deref()).map(|d| d.trim().to_string());
        let context = normalize_text(new.context.as_deref());

        let task = self.db.atomically(|db| {
            let position = top_position(db)?;
            let id = db.create_task(
                &new.content,
                position,
                color,
                label.as_deref(),
                due_date.as_deref(),
                context.as_deref(),
                Utc::now(),
            )?;
            db.get_task(id)?.ok_or(TaskError::TaskNotFound(id))
        })?;

        tracing::debug!(id = task.id, position = task.position, "created task");
        Ok(Some(task))
    }

    /// Replace a task's editable fields.
    ///
    /// An invalid `requires_id` clears the link instead of failing. The
    /// completion note is only written while the task is completed. Returns
    /// `None` if the task does not exist.
    pub fn edit_task(&self, id: i64, edit: &TaskEdit) -> Result<Option<Task>> {
        self.db.atomically(|db| {
            let Some(task) = db.get_task(id)? else {
                return Ok(None);
            };

            let content = edit
                .content
                .as_deref()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(task.content.as_str());
            let color = Color::parse_or_default(edit.color.as_deref());
            let label = normalize_label(edit.label.as_deref());
            let due_date =
                normalize_text(edit.due_date.as_deref()).map(|d| d.trim().to_string());
            let context = normalize_text(edit.context.as_deref());
            let requires_id = resolve_requirement(db, edit.requires_id.as_deref(), id)?;

            db.update_task(
                id,
                content,
                color,
                label.as_deref(),
                due_date.as_deref(),
                requires_id,
                context.as_deref(),
            )?;

            if task.is_completed() {
                let note = normalize_text(edit.completion_note.as_deref());
                db.set_completion_note(id, note.as_deref())?;
            }

            db.get_task(id)
        })
    }

    // ==================== Lifecycle ====================

    /// Flip a task between active and completed.
    ///
    /// Completing stamps `completed_at`. Reactivating clears the timestamp
    /// and note and re-inserts the task at the top. Returns `None` if the
    /// task does not exist.
    pub fn toggle_task(&self, id: i64) -> Result<Option<Task>> {
        let task = self.db.atomically(|db| {
            let Some(task) = db.get_task(id)? else {
                return Ok(None);
            };

            if task.is_completed() {
                let position = top_position(db)?;
                db.mark_active(id, position)?;
            } else {
                db.mark_completed(id, Utc::now())?;
            }

            db.get_task(id)
        })?;

        if let Some(task) = &task {
            tracing::debug!(id, completed = task.is_completed(), "toggled task");
        }
        Ok(task)
    }

    // ==================== Ordering ====================

    /// Swap an active task with its neighbor in the given direction.
    ///
    /// Returns whether a swap happened; completed or unknown tasks and tasks
    /// already at the edge are left alone. If the two positions are equal the
    /// active list is renumbered first so the swap changes the order.
    pub fn move_task(&self, id: i64, direction: Direction) -> Result<bool> {
        self.db.atomically(|db| {
            let mut active = display_active(db)?;
            let tied = match (
                active.iter().find(|t| t.id == id),
                order::neighbor(&active, id, direction),
            ) {
                (Some(task), Some(other)) => task.position == other.position,
                _ => return Ok(false),
            };
            if tied {
                reindex_active(db)?;
                active = display_active(db)?;
            }

            let (Some(task), Some(other)) = (
                active.iter().find(|t| t.id == id),
                order::neighbor(&active, id, direction),
            ) else {
                return Ok(false);
            };

            db.update_position(task.id, other.position)?;
            db.update_position(other.id, task.position)?;
            tracing::debug!(id, with = other.id, %direction, "swapped positions");
            Ok(true)
        })
    }

    /// Assign `position = index` for each id in `ids`.
    ///
    /// Unknown ids are skipped; tasks not mentioned keep their position.
    /// Returns the number of tasks updated.
    pub fn reorder_tasks(&self, ids: &[i64]) -> Result<usize> {
        self.db.atomically(|db| {
            let mut updated = 0;
            for (id, position) in order::sequence_positions(ids) {
                if db.update_position(id, position)? {
                    updated += 1;
                }
            }
            Ok(updated)
        })
    }

    /// Renumber active tasks `0..n` in display order
    pub fn reindex(&self) -> Result<Vec<Task>> {
        self.db.atomically(|db| {
            reindex_active(db)?;
            display_active(db)
        })
    }

    // ==================== Deletion ====================

    /// Delete a task, first unlinking every task that requires it.
    ///
    /// Returns whether the task existed.
    pub fn delete_task(&self, id: i64) -> Result<bool> {
        self.db.atomically(|db| {
            if !db.task_exists(id)? {
                return Ok(false);
            }
            let unlinked = db.clear_requirements_on(id)?;
            db.delete_task(id)?;
            tracing::debug!(id, unlinked, "deleted task");
            Ok(true)
        })
    }

    /// Delete every completed task, unlinking requirements that point into
    /// the removed set. Returns the number of tasks deleted.
    pub fn sweep_completed(&self) -> Result<usize> {
        let swept = self.db.atomically(|db| {
            let doomed = db.get_completed_ids()?;
            for &id in &doomed {
                db.clear_requirements_on(id)?;
            }
            for &id in &doomed {
                db.delete_task(id)?;
            }
            Ok(doomed.len())
        })?;

        tracing::info!(swept, "swept completed tasks");
        Ok(swept)
    }

    /// Tasks whose `requires_id` points at `id`
    pub fn dependents_of(&self, id: i64) -> Result<Vec<i64>> {
        self.db.get_dependents(id)
    }
}

// ==================== Helpers ====================

/// Insert-at-top position, renumbering the active list if `min - 1`
/// would overflow.
fn top_position(db: &Database) -> Result<i64> {
    if let Some(position) = order::top_position(db.min_position()?) {
        return Ok(position);
    }

    tracing::warn!("position range exhausted, reindexing active tasks");
    reindex_active(db)?;
    // Completed tasks can still hold extreme positions; they do not order
    // anything, so park them at zero.
    for id in db.get_completed_ids()? {
        db.update_position(id, 0)?;
    }
    Ok(order::top_position(db.min_position()?).unwrap_or(0))
}

/// Active tasks in display order
fn display_active(db: &Database) -> Result<Vec<Task>> {
    let (active, _) = order::split_for_display(db.get_active_tasks()?);
    Ok(active)
}

fn reindex_active(db: &Database) -> Result<()> {
    let active = display_active(db)?;
    let ids: Vec<i64> = active.iter().map(|t| t.id).collect();
    for (id, position) in order::sequence_positions(&ids) {
        db.update_position(id, position)?;
    }
    Ok(())
}

/// Validate a submitted requirement against the store; invalid → `None`
fn resolve_requirement(db: &Database, raw: Option<&str>, own_id: i64) -> Result<Option<i64>> {
    match parse_requirement(raw, own_id) {
        Some(target) if db.task_exists(target)? => Ok(Some(target)),
        _ => Ok(None),
    }
}
