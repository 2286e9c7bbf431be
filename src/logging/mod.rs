//! Level-filtered application logger.
//!
//! DESIGN
//! ======
//! Every entry goes to the console through `tracing`; when file logging is
//! enabled the same entry is also appended to a JSON-lines file by
//! [`FileSink`]. The level hierarchy is `error < warn < info < http < debug`;
//! an entry is emitted when its level is at or below the configured one.
//!
//! `http` has no `tracing` counterpart, so those entries are emitted at
//! `INFO` under the `http` target.

pub mod file_sink;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::config::LogConfig;
pub use file_sink::{FileSink, LoggingError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warn,
    Info,
    Http,
    Debug,
}

impl Level {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warn" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "http" => Some(Self::Http),
            "debug" => Some(Self::Debug),
            _ => None,
        }
    }

    /// Parse a level, falling back to `info` for missing or unknown values.
    #[must_use]
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        raw.and_then(Self::parse).unwrap_or(Self::Info)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Http => "http",
            Self::Debug => "debug",
        }
    }

    /// Most verbose `tracing` level needed to show entries up to `self`.
    #[must_use]
    pub fn tracing_max(self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info | Self::Http => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install the global console subscriber at the verbosity `level` needs.
pub fn init_console(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level.tracing_max())
        .init();
}

// =============================================================================
// LOGGER
// =============================================================================

/// Cheap-to-clone logger handle shared through `AppState`.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

struct LoggerInner {
    level: Level,
    sink: Option<FileSink>,
}

impl Logger {
    #[must_use]
    pub fn new(level: Level, sink: Option<FileSink>) -> Self {
        Self { inner: Arc::new(LoggerInner { level, sink }) }
    }

    /// Console-only logger.
    #[must_use]
    pub fn console(level: Level) -> Self {
        Self::new(level, None)
    }

    /// Build from config. A log directory that cannot be created disables the
    /// file sink rather than failing startup.
    #[must_use]
    pub fn from_config(config: &LogConfig) -> Self {
        if !config.to_file {
            return Self::console(config.level);
        }
        match FileSink::open(&config.dir) {
            Ok(sink) => Self::new(config.level, Some(sink)),
            Err(e) => {
                tracing::error!(error = %e, dir = %config.dir.display(), "file logging disabled");
                Self::console(config.level)
            }
        }
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.inner.level
    }

    #[must_use]
    pub fn file_sink(&self) -> Option<&FileSink> {
        self.inner.sink.as_ref()
    }

    #[must_use]
    pub fn enabled(&self, level: Level) -> bool {
        level <= self.inner.level
    }

    pub fn log(&self, level: Level, message: &str, meta: Option<&Value>) {
        if !self.enabled(level) {
            return;
        }
        emit_console(level, message, meta);

        if let Some(sink) = &self.inner.sink {
            if let Err(e) = sink.write(level, message, meta) {
                tracing::error!(error = %e, "failed to write to log file");
            }
        }
    }

    pub fn error(&self, message: &str, meta: Option<&Value>) {
        self.log(Level::Error, message, meta);
    }

    pub fn warn(&self, message: &str, meta: Option<&Value>) {
        self.log(Level::Warn, message, meta);
    }

    pub fn info(&self, message: &str, meta: Option<&Value>) {
        self.log(Level::Info, message, meta);
    }

    pub fn http(&self, message: &str, meta: Option<&Value>) {
        self.log(Level::Http, message, meta);
    }

    pub fn debug(&self, message: &str, meta: Option<&Value>) {
        self.log(Level::Debug, message, meta);
    }

    /// Remove the log files. A no-op when file logging is disabled.
    pub fn clear_logs(&self) {
        let Some(sink) = &self.inner.sink else {
            tracing::warn!("file logging is disabled, skipping log cleanup");
            return;
        };
        match sink.clear() {
            Ok(()) => tracing::info!(dir = %sink.dir().display(), "log files cleared"),
            Err(e) => tracing::error!(error = %e, "failed to clear log files"),
        }
    }
}

fn emit_console(level: Level, message: &str, meta: Option<&Value>) {
    let meta = meta.map(Value::to_string).unwrap_or_default();
    match level {
        Level::Error => tracing::error!(meta = %meta, "{message}"),
        Level::Warn => tracing::warn!(meta = %meta, "{message}"),
        Level::Info => tracing::info!(meta = %meta, "{message}"),
        Level::Http => tracing::info!(target: "http", meta = %meta, "{message}"),
        Level::Debug => tracing::debug!(meta = %meta, "{message}"),
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
