//! Tests for config module

use announcer::config::{Config, ConfigError, ConfigHandle};
use announcer::directory::{ConnectionDirectory, RosterDirectory};
use announcer::dispatch::DisplayMode;
use announcer::error::ErrorCategory;
use announcer::scheduler::SelectionMethod;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(content.as_bytes()).expect("write temp file");
    file
}

#[test]
fn test_config_file_exists() {
    let config_path = Path::new("config.toml");
    assert!(
        config_path.exists(),
        "config.toml should exist in project root"
    );
}

#[test]
fn test_sample_config_is_valid() {
    let config = Config::from_file(Path::new("config.toml")).expect("sample config parses");
    config.validate().expect("sample config validates");

    assert_eq!(config.delay, 300);
    assert_eq!(config.method, SelectionMethod::Sequential);
    assert_eq!(config.announcements.len(), 3);

    let handle = ConfigHandle::new(&config);
    assert!(handle.load().catalog.warnings().is_empty());
}

#[test]
fn test_sample_roster_loads() {
    let roster = RosterDirectory::from_file(Path::new("roster.toml")).expect("sample roster");
    assert_eq!(roster.len(), 4);
    assert!(roster.is_ignoring("carol", "survival"));
    assert!(!roster.is_ignoring("alice", "lobby"));
}

#[test]
fn test_load_from_temp_file() {
    let file = write_temp(
        r#"
delay = 10
display = "Title"

[[announcements]]
name = "only"
text = "&bHello"
"#,
    );

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.delay, 10);
    assert_eq!(config.display, DisplayMode::Title);
    assert_eq!(config.announcements[0].servers, vec!["global".to_string()]);
    // Unset sections keep defaults
    assert_eq!(config.title.stay, 60);
    assert_eq!(config.logging.format, "text");
}

#[test]
fn test_missing_file_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::from_file(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::Read { .. })));
}

#[test]
fn test_malformed_file_is_parse_error() {
    let file = write_temp("delay = \"soon\"");
    let err = Config::from_file(file.path()).unwrap_err();

    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains(&file.path().display().to_string()));
}

#[test]
fn test_invalid_values_fail_validation() {
    let file = write_temp(
        r#"
delay = 0

[[announcements]]
name = "a"
text = "x"
"#,
    );

    let config = Config::from_file(file.path()).unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("delay"));
}

#[test]
fn test_reload_from_rewritten_file() {
    let file = write_temp(
        r#"
[[announcements]]
name = "first"
text = "one"
"#,
    );
    let handle = ConfigHandle::new(&Config::from_file(file.path()).unwrap());
    assert_eq!(handle.load().catalog.len(), 1);

    std::fs::write(
        file.path(),
        r#"
[[announcements]]
name = "first"
text = "one"

[[announcements]]
name = "second"
text = "two"
servers = ["lobby"]
"#,
    )
    .unwrap();

    handle.reload(&Config::from_file(file.path()).unwrap());
    let snapshot = handle.load();
    assert_eq!(snapshot.catalog.len(), 2);
    assert!(snapshot.catalog.find("second").is_some());
}

#[test]
fn test_reload_from_file_publishes_snapshot() {
    let handle = ConfigHandle::new(&Config::default());
    let file = write_temp(
        r#"
delay = 20

[[announcements]]
name = "tips"
text = "&aTip"
servers = ["lobby", "(broken"]
"#,
    );

    let warnings = handle.reload_from_file(file.path()).unwrap();

    assert_eq!(warnings.len(), 1);
    assert_eq!(handle.delay(), 20);
    assert_eq!(handle.load().catalog.invalid_patterns(), 1);
}

#[test]
fn test_reload_from_missing_file_is_recoverable() {
    let handle = ConfigHandle::new(&Config::default());
    let dir = tempfile::tempdir().unwrap();

    let err = handle
        .reload_from_file(&dir.path().join("absent.toml"))
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Config);
    assert!(err.is_recoverable());
    assert_eq!(handle.delay(), 300);
}

#[test]
fn test_reload_with_invalid_values_keeps_snapshot() {
    let handle = ConfigHandle::new(&Config {
        delay: 7,
        ..Default::default()
    });
    let file = write_temp("delay = 0");

    let err = handle.reload_from_file(file.path()).unwrap_err();

    assert!(!err.is_recoverable());
    assert!(err.to_string().contains("delay"));
    assert_eq!(handle.delay(), 7);
}
