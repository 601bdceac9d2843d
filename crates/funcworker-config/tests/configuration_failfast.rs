//! Integration tests for fail-fast configuration validation.

use std::ffi::OsString;
use std::fs;

use ortho_config::OrthoConfig;
use tempfile::TempDir;

use funcworker_config::Config;

fn load_with_file(contents: &str) -> Result<Config, String> {
    let temp_dir = TempDir::new().expect("create temp dir");
    let path = temp_dir.path().join("funcworker.toml");
    fs::write(&path, contents).expect("write config");

    let args = vec![
        OsString::from("funcworker"),
        OsString::from("--config-path"),
        path.into_os_string(),
    ];
    Config::load_from_iter(args).map_err(|error| error.to_string())
}

#[test]
fn malformed_config_file_fails_loading() {
    let result = load_with_file("strategy = \"module\" entry_point = \"x\"");
    assert!(result.is_err(), "malformed TOML must not load: {result:?}");
}

#[test]
fn unknown_strategy_fails_loading() {
    let result = load_with_file("strategy = \"eval\"\n");
    assert!(result.is_err(), "unknown strategy must not load: {result:?}");
}

#[test]
fn blank_entry_point_loads_but_fails_validation() {
    let config = load_with_file("entry_point = \"\"\n").expect("blank string is valid TOML");
    assert!(config.validate().is_err());
}
