use crate::config::{DEFAULT_HOST, DEFAULT_PORT};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tasklist")]
#[command(about = "Single-user task list served over HTTP")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Directory holding tasks.db and its backups
    #[arg(long, global = true, env = "TASKLIST_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the web server
    Serve {
        /// Address to bind
        #[arg(long, env = "TASKLIST_HOST", default_value = DEFAULT_HOST)]
        host: String,
        /// Port to listen on
        #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Skip the startup backup of the store file
        #[arg(long)]
        no_backup: bool,
    },

    /// Add a task at the top of the list
    Add {
        /// Task text
        content: String,
        /// Color tag
        #[arg(long)]
        color: Option<String>,
        /// Label (title-cased on save)
        #[arg(long)]
        label: Option<String>,
        /// Due date, YYYY-MM-DD
        #[arg(long)]
        due: Option<String>,
        /// Extra details
        #[arg(long)]
        context: Option<String>,
    },

    /// List tasks: active first, then completed
    List {
        /// Only tasks with this label
        #[arg(long)]
        label: Option<String>,
    },

    /// Show task details
    Show {
        /// Task ID
        id: i64,
    },

    /// Edit a task; omitted fields keep their value, empty strings clear
    Edit {
        /// Task ID
        id: i64,
        /// New text
        #[arg(long)]
        content: Option<String>,
        /// New color tag
        #[arg(long)]
        color: Option<String>,
        /// New label
        #[arg(long)]
        label: Option<String>,
        /// New due date
        #[arg(long)]
        due: Option<String>,
        /// ID of the task this one requires
        #[arg(long)]
        requires: Option<String>,
        /// New details
        #[arg(long)]
        context: Option<String>,
        /// Completion note (completed tasks only)
        #[arg(long)]
        note: Option<String>,
    },

    /// Complete an active task or reactivate a completed one
    Toggle {
        /// Task ID
        id: i64,
    },

    /// Swap a task with its neighbor
    Move {
        /// Task ID
        id: i64,
        /// `up` or `down`
        direction: String,
    },

    /// Set the full order of tasks
    Reorder {
        /// Task IDs, top first
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Delete a task
    Delete {
        /// Task ID
        id: i64,
    },

    /// Delete all completed tasks
    Sweep,

    /// Renumber active positions 0..n
    Reindex,

    /// Back up the store file now
    Backup,
}
