//! Integration tests for configuration module

use std::path::PathBuf;
use zapret_core::{Config, Error, Mode};

#[test]
fn test_empty_toml_is_default() {
    let config = Config::from_toml("").expect("Failed to parse");
    assert_eq!(config, Config::default());
    assert!(config.validate().is_ok());
}

#[test]
fn test_toml_custom_config() {
    let toml_content = r#"
[general]
provider = "Beeline"
mode = "aggressive"
base_dir = "/opt/zapret"

[process]
executable = "winws.exe"
settle_delay_ms = 250
probe_delay_ms = 2000

[service]
name = "zapret-custom"

[notifications]
enabled = false
"#;

    let config = Config::from_toml(toml_content).expect("Failed to parse");

    assert_eq!(config.general.provider, "Beeline");
    assert_eq!(config.general.mode, Mode::Aggressive);
    assert_eq!(config.general.base_dir, Some(PathBuf::from("/opt/zapret")));
    assert_eq!(config.process.executable, "winws.exe");
    assert_eq!(config.process.settle_delay_ms, 250);
    assert_eq!(config.process.probe_delay_ms, 2000);
    assert_eq!(config.service.name, "zapret-custom");
    assert!(!config.notifications.enabled);
    assert!(config.validate().is_ok());
}

#[test]
fn test_toml_serialization_roundtrip() {
    let mut original = Config::default();
    original.general.provider = "TTK".to_string();
    original.general.mode = Mode::Extreme;

    let toml_str = original.to_toml().expect("Failed to serialize");
    let parsed = Config::from_toml(&toml_str).expect("Failed to parse");
    assert_eq!(original, parsed);
}

#[test]
fn test_invalid_mode_rejected() {
    let result = Config::from_toml("[general]\nmode = \"turbo\"\n");
    assert!(matches!(result, Err(Error::TomlParse(_))));
}

#[test]
fn test_config_validation_errors() {
    let mut config = Config::default();
    config.process.probe_delay_ms = 120_000;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.process.executable = "..\\winws.exe".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.service.name = String::new();
    assert!(config.validate().is_err());
}

#[test]
fn test_missing_file() {
    let result = Config::load("/nonexistent/zapret.toml");
    assert!(matches!(result, Err(Error::ConfigNotFound { .. })));
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zapret.toml");
    std::fs::write(&path, "[general]\nprovider = \"MTS\"\n").unwrap();

    let config = Config::load(&path).expect("Failed to load");
    assert_eq!(config.general.provider, "MTS");
    assert_eq!(config.general.mode, Mode::Optimized);
}

#[test]
fn test_mode_accepts_any_known_spelling() {
    for (raw, expected) in [
        ("Extreme", Mode::Extreme),
        ("3", Mode::Aggressive),
        ("Агрессив", Mode::Aggressive),
        ("STANDARD", Mode::Standard),
    ] {
        let config = Config::from_toml(&format!("[general]\nmode = \"{raw}\"\n"))
            .unwrap_or_else(|e| panic!("mode {raw:?} rejected: {e}"));
        assert_eq!(config.general.mode, expected);
    }

    assert!(Config::from_toml("[general]\nmode = \"turbo\"\n").is_err());
}
