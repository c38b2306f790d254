//! Point-in-time copies of the store file, taken before serving starts.

use crate::error::{Result, TaskError};
use chrono::{DateTime, Local};
use rusqlite::{Connection, DatabaseName};
use std::fs;
use std::path::{Path, PathBuf};

/// File name for a backup taken at `at`
pub fn backup_file_name(at: DateTime<Local>) -> String {
    format!("tasks_backup_{}.db", at.format("%Y%m%d_%H%M%S"))
}

/// Copy the store at `db_path` into `backup_dir` using SQLite's online
/// backup API, so a live WAL database is captured consistently.
pub fn perform_backup(db_path: &Path, backup_dir: &Path) -> Result<PathBuf> {
    if !db_path.exists() {
        return Err(TaskError::Backup(format!(
            "store file {} does not exist",
            db_path.display()
        )));
    }

    fs::create_dir_all(backup_dir)?;
    let dst = backup_dir.join(backup_file_name(Local::now()));

    let src = Connection::open(db_path)?;
    src.backup(DatabaseName::Main, &dst, None)?;

    tracing::info!(path = %dst.display(), "database backed up");
    Ok(dst)
}

/// Startup variant: a missing store is skipped and failures only warn.
pub fn backup_on_startup(db_path: &Path, backup_dir: &Path) -> Option<PathBuf> {
    if !db_path.exists() {
        tracing::debug!(path = %db_path.display(), "no store yet, skipping backup");
        return None;
    }

    match perform_backup(db_path, backup_dir) {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::warn!(error = %e, "backup failed");
            None
        }
    }
}
