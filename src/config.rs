//! Runtime configuration parsed from environment variables.
//!
//! SYSTEM CONTEXT
//! ==============
//! `main` loads `.env` (when present) and builds a [`Config`] once. Only
//! malformed numeric values fail startup; a missing backend URL disables the
//! collaborator-backed routes instead of the whole server.

use std::path::PathBuf;

use crate::logging::Level;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_SESSION_COOKIE_NAME: &str = "auth_session";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_STATIC_DIR: &str = "public";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: Level,
    pub to_file: bool,
    pub dir: PathBuf,
    /// Delete existing log files at startup.
    pub clear_on_start: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    /// Base URL of the identity/backend collaborator, without trailing `/`.
    pub backend_url: Option<String>,
    pub backend_timeout_secs: u64,
    pub session_cookie: String,
    pub cookie_secure: bool,
    pub static_dir: PathBuf,
    pub log: LogConfig,
}

impl Config {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `BACKEND_API_URL`: collaborator base URL
    /// - `BACKEND_TIMEOUT_SECS`: default 5
    /// - `LOG_LEVEL`: `error|warn|info|http|debug`, default `info`
    /// - `LOG_TO_FILE`: default false
    /// - `LOG_DIR`: default `logs`
    /// - `LOG_CLEAR_ON_START`: default false
    /// - `SESSION_COOKIE_NAME`: default `auth_session`
    /// - `COOKIE_SECURE`: inferred from `PUBLIC_URL` when unset
    /// - `STATIC_DIR`: default `public`
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` or `BACKEND_TIMEOUT_SECS` is not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env_parse("PORT", DEFAULT_PORT)?;
        let backend_timeout_secs = env_parse("BACKEND_TIMEOUT_SECS", DEFAULT_BACKEND_TIMEOUT_SECS)?;

        let backend_url = env_nonempty("BACKEND_API_URL").map(|url| url.trim_end_matches('/').to_owned());
        let session_cookie =
            env_nonempty("SESSION_COOKIE_NAME").unwrap_or_else(|| DEFAULT_SESSION_COOKIE_NAME.to_owned());
        let cookie_secure = env_bool("COOKIE_SECURE").unwrap_or_else(|| {
            env_nonempty("PUBLIC_URL").is_some_and(|url| url.starts_with("https://"))
        });
        let static_dir = PathBuf::from(env_nonempty("STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_owned()));

        let log = LogConfig {
            level: Level::parse_or_default(std::env::var("LOG_LEVEL").ok().as_deref()),
            to_file: env_bool("LOG_TO_FILE").unwrap_or(false),
            dir: PathBuf::from(env_nonempty("LOG_DIR").unwrap_or_else(|| DEFAULT_LOG_DIR.to_owned())),
            clear_on_start: env_bool("LOG_CLEAR_ON_START").unwrap_or(false),
        };

        Ok(Self { port, backend_url, backend_timeout_secs, session_cookie, cookie_secure, static_dir, log })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            backend_url: None,
            backend_timeout_secs: DEFAULT_BACKEND_TIMEOUT_SECS,
            session_cookie: DEFAULT_SESSION_COOKIE_NAME.to_owned(),
            cookie_secure: false,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            log: LogConfig {
                level: Level::Info,
                to_file: false,
                dir: PathBuf::from(DEFAULT_LOG_DIR),
                clear_on_start: false,
            },
        }
    }
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match env_nonempty(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { var: key, value: raw }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
