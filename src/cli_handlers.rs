use crate::backup;
use crate::config::Config;
use crate::core::TaskList;
use crate::due::time_display_now;
use crate::error::TaskError;
use crate::models::{Direction, NewTask, Task, TaskEdit};
use crate::server;

fn open(config: &Config) -> Result<TaskList, TaskError> {
    config.ensure_data_dir()?;
    TaskList::open(config.db_path())
}

/// Handle the serve command: backup, open the store, then serve
pub async fn handle_serve(config: &Config) -> Result<(), TaskError> {
    config.ensure_data_dir()?;

    // The snapshot must finish before the store is opened for writes
    if config.backup_on_start {
        backup::backup_on_startup(&config.db_path(), &config.backup_dir());
    }

    let tasks = TaskList::open(config.db_path())?;
    server::run(config, tasks).await
}

/// Handle the add command
pub fn handle_add(config: &Config, new: NewTask) -> Result<(), TaskError> {
    let tasks = open(config)?;

    match tasks.create_task(&new)? {
        Some(task) => {
            println!("Created task #{}: {}", task.id, task.content);
            println!("  Position: {}", task.position);
        }
        None => println!("Nothing to add: content is empty"),
    }

    Ok(())
}

/// Handle the list command
pub fn handle_list(config: &Config, label: Option<&str>) -> Result<(), TaskError> {
    let tasks = open(config)?;
    let listing = tasks.list_tasks(label)?;

    if listing.active.is_empty() && listing.completed.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    for task in listing.display_order() {
        let icon = if task.is_completed() { "✓" } else { "○" };

        let mut extras = Vec::new();
        if let Some(label) = &task.label {
            extras.push(format!("[{label}]"));
        }
        if task.is_active() {
            if let Some(due) = time_display_now(task.due_date.as_deref()) {
                extras.push(due);
            }
        }
        if let (Some(id), Some(met)) = (task.requires_id, listing.requirement_met(task)) {
            extras.push(format!("needs #{id} {}", if met { "✓" } else { "○" }));
        }

        let extras = if extras.is_empty() {
            String::new()
        } else {
            format!(" ({})", extras.join(", "))
        };
        println!("  [#{:>3}] {} {}{}", task.id, icon, task.content, extras);
    }

    if !listing.labels.is_empty() {
        println!();
        println!("Labels: {}", listing.labels.join(", "));
    }

    Ok(())
}

/// Handle the show command
pub fn handle_show(config: &Config, id: i64) -> Result<(), TaskError> {
    let tasks = open(config)?;
    let task = tasks.get_task(id)?;

    println!("[#{id}] {content}", id = task.id, content = task.content);
    println!(
        "Status:       {}",
        if task.is_completed() { "completed" } else { "active" }
    );
    println!("Position:     {}", task.position);
    println!("Color:        {}", task.color);
    println!("Created:      {}", task.created_at.format("%Y-%m-%d %H:%M"));

    if let Some(ref label) = task.label {
        println!("Label:        {label}");
    }
    if let Some(ref due) = task.due_date {
        match time_display_now(Some(due)) {
            Some(countdown) => println!("Due:          {due} ({countdown})"),
            None => println!("Due:          {due}"),
        }
    }
    if let Some(required) = task.requires_id {
        println!("Requires:     #{required}");
    }
    let dependents = tasks.dependents_of(task.id)?;
    if !dependents.is_empty() {
        let ids = dependents
            .iter()
            .map(|id| format!("#{id}"))
            .collect::<Vec<_>>()
            .join(", ");
        println!("Required by:  {ids}");
    }
    if let Some(ref context) = task.context {
        println!("Details:      {context}");
    }
    if let Some(completed) = task.completed_at {
        println!("Completed:    {}", completed.format("%Y-%m-%d %H:%M"));
    }
    if let Some(ref note) = task.completion_note {
        println!("Note:         {note}");
    }

    Ok(())
}

/// Changes requested on the command line; `None` keeps the current value
#[derive(Debug, Default)]
pub struct EditArgs {
    pub content: Option<String>,
    pub color: Option<String>,
    pub label: Option<String>,
    pub due: Option<String>,
    pub requires: Option<String>,
    pub context: Option<String>,
    pub note: Option<String>,
}

/// Overlay command-line changes on the task's current values
fn merge_edit(task: &Task, args: EditArgs) -> TaskEdit {
    TaskEdit {
        content: Some(args.content.unwrap_or_else(|| task.content.clone())),
        color: Some(args.color.unwrap_or_else(|| task.color.to_string())),
        label: args.label.or_else(|| task.label.clone()),
        due_date: args.due.or_else(|| task.due_date.clone()),
        requires_id: args
            .requires
            .or_else(|| task.requires_id.map(|id| id.to_string())),
        context: args.context.or_else(|| task.context.clone()),
        completion_note: args.note.or_else(|| task.completion_note.clone()),
    }
}

/// Handle the edit command
pub fn handle_edit(config: &Config, id: i64, args: EditArgs) -> Result<(), TaskError> {
    let tasks = open(config)?;
    let current = tasks.get_task(id)?;

    let requested = args.requires.clone();
    let edit = merge_edit(&current, args);
    let task = tasks
        .edit_task(id, &edit)?
        .ok_or(TaskError::TaskNotFound(id))?;

    println!("Updated task #{}: {}", task.id, task.content);
    if let Some(raw) = requested.filter(|r| !r.trim().is_empty()) {
        if task.requires_id.is_none() {
            eprintln!("Warning: ignored requirement `{raw}` (not another existing task)");
        }
    }

    Ok(())
}

/// Handle the toggle command
pub fn handle_toggle(config: &Config, id: i64) -> Result<(), TaskError> {
    let tasks = open(config)?;
    let task = tasks.toggle_task(id)?.ok_or(TaskError::TaskNotFound(id))?;

    if task.is_completed() {
        println!("Completed task #{}: {}", task.id, task.content);
    } else {
        println!("Reactivated task #{}: {}", task.id, task.content);
    }

    Ok(())
}

/// Handle the move command
pub fn handle_move(config: &Config, id: i64, direction: &str) -> Result<(), TaskError> {
    let direction = Direction::try_from(direction)
        .map_err(|_| TaskError::InvalidDirection(direction.to_string()))?;
    let tasks = open(config)?;

    if tasks.move_task(id, direction)? {
        println!("Moved task #{id} {direction}");
    } else {
        println!("Task #{id} not moved");
    }

    Ok(())
}

/// Handle the reorder command
pub fn handle_reorder(config: &Config, ids: &[i64]) -> Result<(), TaskError> {
    let tasks = open(config)?;
    let updated = tasks.reorder_tasks(ids)?;
    println!("Reordered {updated} tasks");
    Ok(())
}

/// Handle the delete command
pub fn handle_delete(config: &Config, id: i64) -> Result<(), TaskError> {
    let tasks = open(config)?;
    if !tasks.delete_task(id)? {
        return Err(TaskError::TaskNotFound(id));
    }
    println!("Deleted task #{id}");
    Ok(())
}

/// Handle the sweep command
pub fn handle_sweep(config: &Config) -> Result<(), TaskError> {
    let tasks = open(config)?;
    let swept = tasks.sweep_completed()?;
    println!("Removed {swept} completed tasks");
    Ok(())
}

/// Handle the reindex command
pub fn handle_reindex(config: &Config) -> Result<(), TaskError> {
    let tasks = open(config)?;
    let active = tasks.reindex()?;
    println!("Reindexed {} tasks", active.len());
    Ok(())
}

/// Handle the backup command
pub fn handle_backup(config: &Config) -> Result<(), TaskError> {
    let path = backup::perform_backup(&config.db_path(), &config.backup_dir())?;
    println!("Database backed up to: {}", path.display());
    Ok(())
}
