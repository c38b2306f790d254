pub mod backup;
pub mod cli;
pub mod cli_handlers;
pub mod config;
pub mod core;
pub mod db;
pub mod dependency;
pub mod due;
pub mod error;
pub mod models;
pub mod order;
pub mod render;
pub mod server;

pub use error::{Result, TaskError};
pub use models::*;
