//! Tests for TOML config loading, creation, and path resolution.

use super::*;
use std::path::Path;

#[test]
fn load_from_nonexistent_returns_file_not_found() {
    let result = load_from_path(Path::new("/tmp/nonexistent_remotefm_config.toml"));
    let err = result.unwrap_err();
    assert!(matches!(err, remotefm_common::ConfigError::FileNotFound(_)));
}

#[test]
fn load_valid_partial_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[server]
url = "wss://relay.example.com/ws/device"

[transfer]
pacing_ms = 0
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.server.url, "wss://relay.example.com/ws/device");
    assert_eq!(config.transfer.pacing_ms, 0);
    // Defaults preserved
    assert_eq!(config.server.reconnect_delay_secs, 5);
    assert_eq!(config.transfer.chunk_size, 65536);
    assert_eq!(config.device.credential, "default_key");
}

#[test]
fn load_invalid_toml_returns_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "this is not valid toml {{{").unwrap();

    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, remotefm_common::ConfigError::ParseError(_)));
}

#[test]
fn load_config_with_invalid_values_is_returned_as_parsed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[transfer]\nchunk_size = 1\n").unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.transfer.chunk_size, 1);
}

#[test]
fn load_or_create_writes_template_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("remotefm").join("config.toml");

    let config = load_or_create(&path).unwrap();
    assert!(path.exists());
    assert_eq!(config.server.url, "ws://127.0.0.1:8000/ws/device");

    let reloaded = load_from_path(&path).unwrap();
    assert_eq!(reloaded.admin.url, config.admin.url);
}

#[test]
fn default_config_toml_is_valid() {
    use super::template::default_config_toml;
    use crate::schema::RemoteFmConfig;

    let content = default_config_toml();
    let config: RemoteFmConfig = toml::from_str(&content).unwrap();
    assert_eq!(config.transfer.chunk_size, 65536);
}

#[test]
fn default_config_path_is_reasonable() {
    // This may not work in all CI environments, but should work locally
    if let Ok(path) = default_config_path() {
        let path_str = path.to_string_lossy();
        assert!(path_str.contains("remotefm"));
        assert!(path_str.ends_with("config.toml"));
    }
}
