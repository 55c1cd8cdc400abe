//! Integration tests for layered configuration

use framebridge::bridge::AllowedOrigins;
use framebridge::config::ConfigLoader;
use framebridge::frame::IsolationFlag;
use framebridge::FrameBridge;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_workspace_config_builds_bridge() {
    let temp_dir = TempDir::new().unwrap();
    let config_dir = temp_dir.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        r#"
[bridge]
address = "https://widgets.example/embed"
allowed_origins = ["https://widgets.example", "https://cdn.widgets.example"]
isolation_flags = ["allow-scripts", "allow-forms"]
rate_limit_per_second = 25
default_request_timeout_ms = 1500

[logging]
level = "debug"
format = "json"
"#,
    )
    .unwrap();

    let settings = ConfigLoader::load(temp_dir.path()).unwrap();
    assert!(settings.validate().is_ok());
    assert_eq!(settings.logging.level, "debug");
    assert_eq!(settings.bridge.rate_limit_per_second, 25);
    assert_eq!(settings.bridge.default_request_timeout_ms, 1500);
    assert!(settings
        .bridge
        .isolation_flags
        .contains(&IsolationFlag::AllowForms));

    let (bridge, _events) = FrameBridge::new(&settings.bridge);
    assert_eq!(
        bridge.allowed_origins(),
        AllowedOrigins::list(["https://widgets.example", "https://cdn.widgets.example"])
    );
    assert_eq!(bridge.sandbox_attribute(), "allow-scripts allow-forms");
}

#[test]
fn test_wildcard_string_in_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bridge.toml");
    fs::write(
        &path,
        r#"
[bridge]
address = "https://widgets.example/embed"
allowed_origins = "*"
"#,
    )
    .unwrap();

    let settings = ConfigLoader::load_from_file(&path).unwrap();
    assert_eq!(settings.bridge.allowed_origins, AllowedOrigins::Any);
    assert!(settings.validate().is_ok());
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = ConfigLoader::load_from_file(&temp_dir.path().join("absent.toml"));
    assert!(result.is_err());
}

#[test]
fn test_invalid_values_fail_validation() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bridge.toml");
    fs::write(
        &path,
        r#"
[bridge]
allowed_origins = ["widgets.example"]
default_request_timeout_ms = 0
"#,
    )
    .unwrap();

    let settings = ConfigLoader::load_from_file(&path).unwrap();
    let errors = settings.validate().unwrap_err();
    assert_eq!(errors.len(), 2);
}
