//! Append-only JSON-lines log files.
//!
//! Each entry is serialized to one line and written with a single
//! `write_all` on a file opened in append mode, so concurrent writers never
//! interleave within a line. Errors land in `error.log`, everything else in
//! `all.log`.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::Level;

pub const ALL_LOG: &str = "all.log";
pub const ERROR_LOG: &str = "error.log";

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1B\[[0-9;]*m").expect("ANSI escape pattern compiles"));

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("log file i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("log entry encode failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("timestamp format failed: {0}")]
    Timestamp(#[from] time::error::Format),
}

#[derive(Debug, Serialize)]
pub struct LogEntry<'a> {
    pub timestamp: String,
    pub level: Level,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<&'a Value>,
}

#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    /// Create the log directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, LoggingError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, level: Level) -> PathBuf {
        match level {
            Level::Error => self.dir.join(ERROR_LOG),
            _ => self.dir.join(ALL_LOG),
        }
    }

    /// Append one entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be encoded or appended.
    pub fn write(&self, level: Level, message: &str, meta: Option<&Value>) -> Result<(), LoggingError> {
        let entry = LogEntry {
            timestamp: OffsetDateTime::now_utc().format(&Rfc3339)?,
            level,
            message: strip_ansi(message),
            meta,
        };
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(level))?;
        file.write_all(&line)?;
        Ok(())
    }

    /// Delete both log files. Missing files are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or a file cannot
    /// be removed.
    pub fn clear(&self) -> Result<(), LoggingError> {
        fs::create_dir_all(&self.dir)?;
        for name in [ALL_LOG, ERROR_LOG] {
            match fs::remove_file(self.dir.join(name)) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

#[must_use]
pub fn strip_ansi(message: &str) -> String {
    ANSI_ESCAPE.replace_all(message, "").into_owned()
}

#[cfg(test)]
#[path = "file_sink_test.rs"]
mod tests;
