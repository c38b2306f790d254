//! Runtime configuration: where the store lives and where to listen.

use crate::error::{Result, TaskError};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Name of the store file inside the data directory.
pub const DB_FILE_NAME: &str = "tasks.db";

/// Name of the backup directory inside the data directory.
pub const BACKUP_DIR_NAME: &str = "backups";

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_HOST: &str = "0.0.0.0";

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub backup_on_start: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            backup_on_start: true,
        }
    }
}

impl Config {
    pub fn with_data_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.data_dir.join(BACKUP_DIR_NAME)
    }

    /// Create the data directory if it does not exist yet
    pub fn ensure_data_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| {
                TaskError::InvalidConfig(format!(
                    "cannot listen on {}:{}",
                    self.host, self.port
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_paths() {
        let config = Config::default();
        assert_eq!(config.db_path(), PathBuf::from("data").join("tasks.db"));
        assert_eq!(config.backup_dir(), PathBuf::from("data").join("backups"));
        assert_eq!(config.port, 5000);
        assert!(config.backup_on_start);
    }

    #[test]
    fn test_bind_addr() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:8080");

        let bad = Config {
            host: "not a host".to_string(),
            ..Config::default()
        };
        assert!(matches!(bad.bind_addr(), Err(TaskError::InvalidConfig(_))));
    }

    #[test]
    fn test_ensure_data_dir() {
        let temp = TempDir::new().unwrap();
        let config = Config::with_data_dir(temp.path().join("nested").join("data"));
        config.ensure_data_dir().unwrap();
        assert!(config.data_dir.is_dir());
    }
}
