//! Config file resolution and graceful fallback to defaults
//!
//! Tests that manipulate THEMEPROBE_CONFIG are marked #[serial] so they never
//! race on process environment.

use serial_test::serial;
use std::env;
use std::io::Write;
use themeprobe_common::config::{resolve_config_file, ProbeConfig, CONFIG_ENV_VAR};
use themeprobe_common::Error;

#[test]
#[serial]
fn test_cli_path_beats_env_var() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/themeprobe-from-env.toml");

    let cli = std::path::Path::new("/tmp/themeprobe-from-cli.toml");
    let resolved = resolve_config_file(Some(cli));
    assert_eq!(resolved.as_deref(), Some(cli));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_used_without_cli_arg() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/themeprobe-from-env.toml");

    let resolved = resolve_config_file(None).unwrap();
    assert_eq!(resolved.to_string_lossy(), "/tmp/themeprobe-from-env.toml");

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_load_from_env_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        wait_frames = 4
        run_timeout_ms = 1000

        [logging]
        level = "debug"
        "#
    )
    .unwrap();

    env::set_var(CONFIG_ENV_VAR, file.path());
    let config = ProbeConfig::load(None).unwrap();
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(config.wait_frames, 4);
    assert_eq!(config.run_timeout_ms, 1000);
    assert_eq!(config.logging.level, "debug");
    // Unspecified keys keep their defaults
    assert_eq!(config.connect_timeout_ms, 15_000);
}

#[test]
fn test_missing_explicit_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");

    let result = ProbeConfig::load(Some(&missing));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_malformed_file_is_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "layers = 7").unwrap();

    let result = ProbeConfig::load_file(file.path());
    assert!(matches!(result, Err(Error::Config(_))));
}
