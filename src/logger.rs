use anyhow::Result;
use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// Append-only session log, one timestamped file per bot run.
pub struct Logger {
    log_file: PathBuf,
}

impl Logger {
    pub fn new(log_dir: &str) -> Result<Self> {
        let dir = PathBuf::from(log_dir);
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let log_file = dir.join(format!("session_{}.log", timestamp));

        Ok(Self { log_file })
    }

    pub fn log(&self, message: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)?;

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(file, "[{}] {}", timestamp, message)?;
        Ok(())
    }

    /// One line per handled command: who sent what, and how it ended.
    pub fn log_command(&self, command: &str, user_id: i64, outcome: &str) -> Result<()> {
        self.log(&format!("COMMAND {command} | user_id={user_id} | {outcome}"))
    }

    pub fn log_warning(&self, message: &str) -> Result<()> {
        self.log(&format!("WARNING: {}", message))
    }

    pub fn log_error(&self, error: &str) -> Result<()> {
        self.log(&format!("ERROR: {}", error))
    }
}
