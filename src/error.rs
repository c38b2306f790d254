use thiserror::Error;

/// All possible errors in the task list
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Task #{0} not found")]
    TaskNotFound(i64),

    #[error("Invalid direction: {0} (expected `up` or `down`)")]
    InvalidDirection(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Backup failed: {0}")]
    Backup(String),

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, TaskError>;
