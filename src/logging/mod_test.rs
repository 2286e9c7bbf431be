use super::*;
use serde_json::json;
use std::path::PathBuf;

fn temp_dir(name: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    std::env::temp_dir().join(format!("portico-logger-{name}-{}-{nanos}", std::process::id()))
}

// =============================================================================
// Level
// =============================================================================

#[test]
fn level_hierarchy_orders_error_first() {
    assert!(Level::Error < Level::Warn);
    assert!(Level::Warn < Level::Info);
    assert!(Level::Info < Level::Http);
    assert!(Level::Http < Level::Debug);
}

#[test]
fn level_parse_is_case_insensitive() {
    assert_eq!(Level::parse("HTTP"), Some(Level::Http));
    assert_eq!(Level::parse(" warn "), Some(Level::Warn));
    assert_eq!(Level::parse("trace"), None);
}

#[test]
fn level_parse_or_default_uses_info() {
    assert_eq!(Level::parse_or_default(None), Level::Info);
    assert_eq!(Level::parse_or_default(Some("nope")), Level::Info);
    assert_eq!(Level::parse_or_default(Some("debug")), Level::Debug);
}

#[test]
fn level_display_matches_serde() {
    for level in [Level::Error, Level::Warn, Level::Info, Level::Http, Level::Debug] {
        assert_eq!(serde_json::to_value(level).unwrap(), json!(level.to_string()));
    }
}

#[test]
fn http_shares_info_tracing_level() {
    assert_eq!(Level::Http.tracing_max(), tracing::Level::INFO);
    assert_eq!(Level::Debug.tracing_max(), tracing::Level::DEBUG);
}

// =============================================================================
// Logger
// =============================================================================

#[test]
fn enabled_respects_threshold() {
    let logger = Logger::console(Level::Info);
    assert!(logger.enabled(Level::Error));
    assert!(logger.enabled(Level::Info));
    assert!(!logger.enabled(Level::Http));
    assert!(!logger.enabled(Level::Debug));
}

#[test]
fn filtered_entries_never_reach_file() {
    let dir = temp_dir("filtered");
    let logger = Logger::new(Level::Warn, Some(FileSink::open(&dir).unwrap()));

    logger.info("quiet", None);
    logger.http("quiet", None);
    logger.warn("loud", Some(&json!({ "k": 1 })));

    let raw = std::fs::read_to_string(dir.join(file_sink::ALL_LOG)).unwrap();
    assert_eq!(raw.lines().count(), 1);
    assert!(raw.contains("loud"));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn sink_failure_is_swallowed() {
    let dir = temp_dir("swallow");
    let logger = Logger::new(Level::Debug, Some(FileSink::open(&dir).unwrap()));
    std::fs::remove_dir_all(&dir).unwrap();

    // Must not panic or propagate.
    logger.error("sink is gone", None);
    logger.http("sink is gone", None);
}

#[test]
fn from_config_without_file_logging_has_no_sink() {
    let config = LogConfig { level: Level::Http, to_file: false, dir: temp_dir("unused"), clear_on_start: false };
    let logger = Logger::from_config(&config);
    assert!(logger.file_sink().is_none());
    assert_eq!(logger.level(), Level::Http);
}

#[test]
fn from_config_with_file_logging_creates_dir() {
    let dir = temp_dir("config");
    let config = LogConfig { level: Level::Info, to_file: true, dir: dir.clone(), clear_on_start: false };
    let logger = Logger::from_config(&config);
    assert!(logger.file_sink().is_some());
    assert!(dir.is_dir());
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn clear_logs_removes_written_files() {
    let dir = temp_dir("clear");
    let logger = Logger::new(Level::Info, Some(FileSink::open(&dir).unwrap()));
    logger.error("x", None);
    assert!(dir.join(file_sink::ERROR_LOG).exists());

    logger.clear_logs();
    assert!(!dir.join(file_sink::ERROR_LOG).exists());

    // Console-only logger tolerates the call.
    Logger::console(Level::Info).clear_logs();
    std::fs::remove_dir_all(&dir).ok();
}
