//! Tests for config file resolution, loading and atomic write-back
//!
//! Tests that touch GIGMAP_CONFIG are marked #[serial] so they never race
//! each other on the process environment.

use gigmap_common::config::{
    load_config, write_toml_config, ConfigResolver, ConfigSource, PacingConfig, TomlConfig,
    CONFIG_ENV_VAR,
};
use gigmap_common::Error;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
#[serial]
fn test_cli_path_beats_environment() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/gigmap-env.toml");

    let resolver = ConfigResolver::new(Some(PathBuf::from("/tmp/gigmap-cli.toml")));
    assert_eq!(
        resolver.resolve(),
        ConfigSource::CommandLine(PathBuf::from("/tmp/gigmap-cli.toml"))
    );

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_environment_used_without_cli() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/gigmap-env.toml");

    let resolver = ConfigResolver::new(None);
    assert_eq!(
        resolver.resolve(),
        ConfigSource::Environment(PathBuf::from("/tmp/gigmap-env.toml"))
    );

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_blank_environment_is_ignored() {
    env::set_var(CONFIG_ENV_VAR, "   ");

    let source = ConfigResolver::new(None).resolve();
    assert!(!matches!(source, ConfigSource::Environment(_)));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
fn test_missing_file_degrades_to_defaults() {
    let dir = TempDir::new().unwrap();
    let source = ConfigSource::CommandLine(dir.path().join("absent.toml"));

    let config = load_config(&source).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_defaults_source_loads_defaults() {
    let config = load_config(&ConfigSource::Defaults).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_malformed_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "data_dir = [unterminated").unwrap();

    let result = load_config(&ConfigSource::CommandLine(path));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_write_then_load_preserves_fields() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    let mut config = TomlConfig {
        data_dir: PathBuf::from("/srv/gigmap"),
        places_api_key: Some("key123".to_string()),
        pacing: PacingConfig::immediate(),
        ..TomlConfig::default()
    };
    config.geocoding.coastal_localities.push("Eraclea".to_string());

    write_toml_config(&config, &path).unwrap();
    assert!(!dir.path().join("config.toml.tmp").exists());

    let loaded = load_config(&ConfigSource::CommandLine(path)).unwrap();
    assert_eq!(loaded, config);
}

#[cfg(unix)]
#[test]
fn test_written_config_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    write_toml_config(&TomlConfig::default(), &path).unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}
