//! Integration tests for Settings loading with layered merge semantics.
//!
//! These tests do not touch process environment variables; env overrides are
//! covered in `settings_env_test.rs` which runs as its own binary.

use std::fs;

use flagparse::{Formatter, Settings, SettingsError};
use tempfile::TempDir;

#[test]
fn given_no_file_when_load_then_returns_defaults() {
    let settings = Settings::load(None).expect("load settings");

    assert_eq!(settings.help.max_help_position, 48);
    assert_eq!(settings.help.indent_increment, 2);
}

#[test]
fn given_partial_file_when_load_then_overlays_only_specified_fields() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("calc.toml");
    fs::write(
        &path,
        r#"
[help]
width = 80
show_defaults = false
"#,
    )
    .unwrap();

    let settings = Settings::load(Some(path.as_path())).expect("load settings");

    assert_eq!(settings.help.width, 80);
    assert!(!settings.help.show_defaults);
    assert_eq!(settings.help.max_help_position, 48);
}

#[test]
fn given_missing_file_when_load_then_read_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let err = Settings::load(Some(path.as_path())).unwrap_err();

    assert!(matches!(err, SettingsError::Read { .. }));
}

#[test]
fn given_malformed_file_when_load_then_parse_error_names_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[help\nwidth = ").unwrap();

    let err = Settings::load(Some(path.as_path())).unwrap_err();

    assert!(matches!(err, SettingsError::Parse { .. }));
    assert!(err.to_string().contains("broken.toml"));
}

#[test]
fn given_settings_when_building_formatter_then_layout_follows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("calc.toml");
    fs::write(&path, "[help]\nwidth = 60\nmax_help_position = 30\n").unwrap();
    let settings = Settings::load(Some(path.as_path())).unwrap();

    let formatter = Formatter::from(&settings.help);

    assert_eq!(formatter.width, 60);
    assert_eq!(formatter.help_position(), 30);
}

#[test]
fn given_loaded_settings_when_rendered_then_reloads_identically() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("calc.toml");
    fs::write(&path, "[help]\nindent_increment = 4\n").unwrap();
    let settings = Settings::load(Some(path.as_path())).unwrap();

    let copy = dir.path().join("copy.toml");
    fs::write(&copy, settings.to_toml().unwrap()).unwrap();

    assert_eq!(Settings::load(Some(copy.as_path())).unwrap(), settings);
}
